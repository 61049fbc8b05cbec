/// A monitored enclosure (or shared cooling loop) and the power drawn by its
/// defrost heaters while a cycle runs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Zone {
    pub name: String,
    pub rated_power_kw: f64,
}

impl Zone {
    pub fn new(name: impl Into<String>, rated_power_kw: f64) -> Self {
        Self {
            name: name.into(),
            rated_power_kw,
        }
    }
}
