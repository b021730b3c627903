use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Veteran-specific benefits offered by a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VeteranBenefit {
    pub state_code: String,

    // Property tax
    pub property_tax_exemption: bool,
    pub property_tax_exemption_amount: Option<Decimal>,
    pub homestead_exemption: Option<Decimal>,

    // Income tax
    pub military_retirement_exempt: bool,
    pub disability_compensation_exempt: bool,

    // Other
    pub vehicle_registration_discount: bool,
    pub hunting_fishing_license_free: bool,

    #[serde(default)]
    pub notes: String,
}

impl VeteranBenefit {
    /// Benefits assumed for a state without a record: military retirement is
    /// taxed, VA disability compensation is not.
    pub fn assumed(state_code: &str) -> Self {
        Self {
            state_code: state_code.to_string(),
            property_tax_exemption: false,
            property_tax_exemption_amount: None,
            homestead_exemption: None,
            military_retirement_exempt: false,
            disability_compensation_exempt: true,
            vehicle_registration_discount: false,
            hunting_fishing_license_free: false,
            notes: String::new(),
        }
    }
}
