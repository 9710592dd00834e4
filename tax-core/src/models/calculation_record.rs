use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationType {
    PersonalIncomeTax,
    CorporateTax,
    Vat,
}

impl CalculationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersonalIncomeTax => "personal_income_tax",
            Self::CorporateTax => "corporate_tax",
            Self::Vat => "vat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "personal_income_tax" => Some(Self::PersonalIncomeTax),
            "corporate_tax" => Some(Self::CorporateTax),
            "vat" => Some(Self::Vat),
            _ => None,
        }
    }
}

/// Envelope handed to whatever stores calculation history.
///
/// Input and result are kept as opaque JSON so the store does not need to
/// know the shape of each calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRecord {
    pub calculation_type: CalculationType,
    pub input_data: Value,
    pub result: Value,
}

impl CalculationRecord {
    pub fn new<I, R>(
        calculation_type: CalculationType,
        input: &I,
        result: &R,
    ) -> Result<Self, serde_json::Error>
    where
        I: Serialize,
        R: Serialize,
    {
        Ok(Self {
            calculation_type,
            input_data: serde_json::to_value(input)?,
            result: serde_json::to_value(result)?,
        })
    }
}
