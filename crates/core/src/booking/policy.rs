use serde::{Deserialize, Serialize};

pub const DEFAULT_INTENT_NAME: &str = "BookMovieTickets";

/// Inclusive range of bookable start hours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange {
    pub min: u32,
    pub max: u32,
}

impl HourRange {
    pub fn contains(&self, hour: u32) -> bool {
        (self.min..=self.max).contains(&hour)
    }
}

/// What to answer once every slot validates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentMode {
    /// Close the dialog as soon as validation passes, whatever the stage.
    #[default]
    Immediate,
    /// Delegate back to the host during collection and close only on the fulfillment hook.
    AwaitFulfillmentStage,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionLabelStyle {
    #[default]
    Label,
    LabelWithPrice,
}

impl std::str::FromStr for FulfillmentMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(Self::Immediate),
            "await_fulfillment_stage" => Ok(Self::AwaitFulfillmentStage),
            other => Err(format!(
                "unsupported fulfillment mode `{other}` (expected immediate|await_fulfillment_stage)"
            )),
        }
    }
}

impl std::str::FromStr for OptionLabelStyle {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "label" => Ok(Self::Label),
            "label_with_price" => Ok(Self::LabelWithPrice),
            other => Err(format!(
                "unsupported option label style `{other}` (expected label|label_with_price)"
            )),
        }
    }
}

/// Booking rules that vary between deployments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookingPolicy {
    pub allow_same_day_booking: bool,
    pub enforce_hour_range: Option<HourRange>,
    pub fulfillment: FulfillmentMode,
    pub option_labels: OptionLabelStyle,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            allow_same_day_booking: true,
            enforce_hour_range: None,
            fulfillment: FulfillmentMode::Immediate,
            option_labels: OptionLabelStyle::Label,
        }
    }
}
