//! Subscription plan catalog for Clarimed.
//!
//! Plans are immutable catalog entries: a tier identifier, a per-chat
//! question allowance, a price, and a validity duration. The catalog is
//! static configuration, not user data; quota decisions read the catalog
//! through `PlanCatalog`, never from storage.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Subscription tier identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanId {
    Free,
    Starter,
    Pro,
    Unlimited,
}

impl PlanId {
    pub fn is_free(&self) -> bool {
        matches!(self, PlanId::Free)
    }
}

impl Default for PlanId {
    fn default() -> Self {
        PlanId::Free
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanId::Free => write!(f, "free"),
            PlanId::Starter => write!(f, "starter"),
            PlanId::Pro => write!(f, "pro"),
            PlanId::Unlimited => write!(f, "unlimited"),
        }
    }
}

impl FromStr for PlanId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(PlanId::Free),
            "starter" => Ok(PlanId::Starter),
            "pro" => Ok(PlanId::Pro),
            "unlimited" => Ok(PlanId::Unlimited),
            other => Err(format!("invalid plan id: '{other}'")),
        }
    }
}

/// Per-chat question allowance: a finite count or the unlimited sentinel.
///
/// Serializes as the finite count or `null` for unlimited, which is what
/// catalog consumers (clients rendering upgrade prompts) expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionAllowance {
    Limited(u32),
    Unlimited,
}

impl QuestionAllowance {
    /// Whether another question is allowed after `used` questions.
    ///
    /// Strictly-less comparison: a plan with allowance k admits questions
    /// 1..=k and denies the (k+1)-th.
    pub fn permits(&self, used: u32) -> bool {
        match self {
            QuestionAllowance::Unlimited => true,
            QuestionAllowance::Limited(k) => used < *k,
        }
    }

    /// The finite limit, or `None` for unlimited.
    pub fn limit(&self) -> Option<u32> {
        match self {
            QuestionAllowance::Limited(k) => Some(*k),
            QuestionAllowance::Unlimited => None,
        }
    }
}

impl Serialize for QuestionAllowance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.limit().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for QuestionAllowance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<u32>::deserialize(deserializer)? {
            Some(k) => Ok(QuestionAllowance::Limited(k)),
            None => Ok(QuestionAllowance::Unlimited),
        }
    }
}

impl fmt::Display for QuestionAllowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionAllowance::Limited(k) => write!(f, "{k}"),
            QuestionAllowance::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// One immutable catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub display_name: String,
    pub questions_per_chat: QuestionAllowance,
    pub price_minor_units: u32,
    /// Validity window after activation; `None` means the plan never expires
    /// on its own (the free tier).
    pub duration_days: Option<u32>,
}

/// The static plan catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCatalog {
    pub plans: Vec<Plan>,
}

impl PlanCatalog {
    /// Look up a catalog entry. The catalog always contains every `PlanId`,
    /// so this cannot miss for ids produced by parsing.
    pub fn get(&self, id: PlanId) -> &Plan {
        self.plans
            .iter()
            .find(|p| p.id == id)
            .unwrap_or_else(|| &self.plans[0])
    }

    pub fn free(&self) -> &Plan {
        self.get(PlanId::Free)
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self {
            plans: vec![
                Plan {
                    id: PlanId::Free,
                    display_name: "Free Plan".to_string(),
                    questions_per_chat: QuestionAllowance::Limited(3),
                    price_minor_units: 0,
                    duration_days: None,
                },
                Plan {
                    id: PlanId::Starter,
                    display_name: "Starter Plan".to_string(),
                    questions_per_chat: QuestionAllowance::Limited(10),
                    price_minor_units: 9_900,
                    duration_days: Some(30),
                },
                Plan {
                    id: PlanId::Pro,
                    display_name: "Pro Plan".to_string(),
                    questions_per_chat: QuestionAllowance::Limited(50),
                    price_minor_units: 29_900,
                    duration_days: Some(30),
                },
                Plan {
                    id: PlanId::Unlimited,
                    display_name: "Unlimited Plan".to_string(),
                    questions_per_chat: QuestionAllowance::Unlimited,
                    price_minor_units: 99_900,
                    duration_days: Some(30),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_id_roundtrip() {
        for id in [PlanId::Free, PlanId::Starter, PlanId::Pro, PlanId::Unlimited] {
            let s = id.to_string();
            let parsed: PlanId = s.parse().unwrap();
            assert_eq!(id, parsed);
        }
    }

    #[test]
    fn test_plan_id_invalid() {
        assert!("platinum".parse::<PlanId>().is_err());
    }

    #[test]
    fn test_allowance_permits_strictly_below_limit() {
        let allowance = QuestionAllowance::Limited(10);
        assert!(allowance.permits(0));
        assert!(allowance.permits(9));
        assert!(!allowance.permits(10));
        assert!(!allowance.permits(11));
    }

    #[test]
    fn test_allowance_unlimited_always_permits() {
        let allowance = QuestionAllowance::Unlimited;
        assert!(allowance.permits(0));
        assert!(allowance.permits(1_000_000));
        assert_eq!(allowance.limit(), None);
    }

    #[test]
    fn test_allowance_serde() {
        let json = serde_json::to_string(&QuestionAllowance::Limited(10)).unwrap();
        assert_eq!(json, "10");
        let json = serde_json::to_string(&QuestionAllowance::Unlimited).unwrap();
        assert_eq!(json, "null");

        let parsed: QuestionAllowance = serde_json::from_str("50").unwrap();
        assert_eq!(parsed, QuestionAllowance::Limited(50));
        let parsed: QuestionAllowance = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, QuestionAllowance::Unlimited);
    }

    #[test]
    fn test_catalog_contents() {
        let catalog = PlanCatalog::default();
        assert_eq!(catalog.plans.len(), 4);

        let starter = catalog.get(PlanId::Starter);
        assert_eq!(starter.display_name, "Starter Plan");
        assert_eq!(starter.questions_per_chat, QuestionAllowance::Limited(10));
        assert_eq!(starter.duration_days, Some(30));

        let free = catalog.free();
        assert_eq!(free.price_minor_units, 0);
        assert_eq!(free.duration_days, None);

        let unlimited = catalog.get(PlanId::Unlimited);
        assert_eq!(unlimited.questions_per_chat, QuestionAllowance::Unlimited);
    }
}
