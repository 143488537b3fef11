use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(BodyZone {
    Face => "face",
    Neck => "neck",
    Chest => "chest",
    Trunk => "trunk",
    Abdomen => "abdomen",
    Arms => "arms",
    Legs => "legs",
    Hands => "hands",
    Feet => "feet",
    Scalp => "scalp",
    Extremities => "extremities",
    All => "all",
});

str_enum!(Severity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
});

str_enum!(Urgency {
    Low => "low",
    Medium => "medium",
    High => "high",
    Indeterminate => "indeterminate",
});

str_enum!(NarrativeSource {
    Remote => "remote",
    RemoteUnstructured => "remote_unstructured",
    Local => "local",
});

str_enum!(ConsultationStatus {
    Pending => "pending",
    Completed => "completed",
    Reviewed => "reviewed",
});

str_enum!(Role {
    Clinician => "clinician",
    Admin => "admin",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn body_zone_round_trip() {
        for zone in BodyZone::all() {
            assert_eq!(BodyZone::from_str(zone.as_str()).unwrap(), *zone);
        }
        assert_eq!(BodyZone::all().len(), 12);
    }

    #[test]
    fn severity_round_trip() {
        for (variant, s) in [
            (Severity::Mild, "mild"),
            (Severity::Moderate, "moderate"),
            (Severity::Severe, "severe"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Severity::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn serde_matches_as_str() {
        let json = serde_json::to_string(&NarrativeSource::RemoteUnstructured).unwrap();
        assert_eq!(json, "\"remote_unstructured\"");
        let urgency: Urgency = serde_json::from_str("\"indeterminate\"").unwrap();
        assert_eq!(urgency, Urgency::Indeterminate);
    }

    #[test]
    fn display_uses_database_form() {
        assert_eq!(Urgency::High.to_string(), "high");
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(BodyZone::from_str("elbow").is_err());
        assert!(Severity::from_str("").is_err());
        assert!(ConsultationStatus::from_str("Completed").is_err());
    }
}
