use crate::analyze::SensorDescriptor;
use crate::domain::selection::SensorSelection;

/// Type name of the per-pipe temperature channel
pub const TEMPERATURE_TYPE: &str = "Температура";
/// Row key of the temperature channel
pub const TEMPERATURE_KEY: &str = "T";

/// Find the descriptor a selection refers to.
#[must_use]
pub fn find_descriptor<'a>(
    selection: &SensorSelection,
    metadata: &'a [SensorDescriptor],
) -> Option<&'a SensorDescriptor> {
    metadata
        .iter()
        .find(|d| d.sensor_type == selection.sensor_type && d.number == selection.number)
}

/// Row key for a selected sensor.
///
/// Numbered sensors use their descriptor's code. When the descriptor is
/// missing the key is guessed as `<first letter of type>_<number>`, which only
/// matches codes that follow that convention.
#[must_use]
pub fn sensor_key(selection: &SensorSelection, metadata: &[SensorDescriptor]) -> String {
    let Some(number) = selection.number else {
        if selection.sensor_type == TEMPERATURE_TYPE {
            return TEMPERATURE_KEY.to_string();
        }
        return selection.sensor_type.clone();
    };

    if let Some(descriptor) = find_descriptor(selection, metadata)
        && !descriptor.code.is_empty()
    {
        return descriptor.code.clone();
    }

    let prefix: String = selection
        .sensor_type
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default();
    let key = format!("{prefix}_{number}");

    tracing::warn!(
        sensor_type = %selection.sensor_type,
        number,
        key = %key,
        "No metadata for sensor, using synthesized key"
    );

    key
}
