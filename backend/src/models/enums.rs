//! Closed vocabularies shared by plans and backend queries.

use crate::{define_code_enum, define_id_type};

define_id_type!(i64, ProviderGroupId);

define_code_enum!(
    /// Patient sex as understood by the metrics backend.
    SexType {
        Male => "MALE",
        Female => "FEMALE",
    }
);

define_code_enum!(
    StrokeType {
        Ischemic => "ISCHEMIC",
        TransientIschemic => "TRANSIENT_ISCHEMIC",
        IntracerebralHemorrhage => "INTRACEREBRAL_HEMORRHAGE",
        SubarachnoidHemorrhage => "SUBARACHNOID_HEMORRHAGE",
        CerebralVenousThrombosis => "CEREBRAL_VENOUS_THROMBOSIS",
        Undetermined => "UNDETERMINED",
    }
);

define_code_enum!(
    /// Comparison operators accepted by integer and date leaves.
    Operator {
        Eq => "EQ",
        Ne => "NE",
        Gt => "GT",
        Ge => "GE",
        Lt => "LT",
        Le => "LE",
    }
);

define_code_enum!(
    /// Integer-valued case properties that can be range-filtered.
    NumericProperty {
        Age => "AGE",
        AdmissionNihss => "ADMISSION_NIHSS",
        Glucose => "GLUCOSE",
        Cholesterol => "CHOLESTEROL",
        SystolicPressure => "SYSTOLIC_PRESSURE",
        DiastolicPressure => "DIASTOLIC_PRESSURE",
    }
);

define_code_enum!(
    DateProperty {
        DischargeDate => "DISCHARGE_DATE",
        AdmissionDate => "ADMISSION_DATE",
        OnsetDate => "ONSET_DATE",
    }
);

define_code_enum!(
    /// Aggregation grain for time groupings and window units.
    TimeGrain {
        Day => "DAY",
        Week => "WEEK",
        Biweek => "BIWEEK",
        Month => "MONTH",
        Quarter => "QUARTER",
        Year => "YEAR",
    }
);

impl Operator {
    /// True for operators that bound a range from below.
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, Operator::Ge | Operator::Gt)
    }

    pub fn is_upper_bound(&self) -> bool {
        matches!(self, Operator::Le | Operator::Lt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("male".parse::<SexType>(), Ok(SexType::Male));
        assert_eq!(" Ischemic ".parse::<StrokeType>(), Ok(StrokeType::Ischemic));
        assert!("UNKNOWN".parse::<SexType>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_codes() {
        let json = serde_json::to_string(&NumericProperty::AdmissionNihss).unwrap();
        assert_eq!(json, "\"ADMISSION_NIHSS\"");
        let op: Operator = serde_json::from_str("\"ge\"").unwrap();
        assert_eq!(op, Operator::Ge);
        assert!(serde_json::from_str::<Operator>("\"BETWEEN\"").is_err());
    }

    #[test]
    fn test_all_preserves_declaration_order() {
        assert_eq!(SexType::ALL, &[SexType::Male, SexType::Female]);
        assert_eq!(StrokeType::ALL.len(), 6);
        assert_eq!(StrokeType::ALL[0], StrokeType::Ischemic);
    }

    #[test]
    fn test_provider_group_id() {
        let id = ProviderGroupId::new(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }
}
