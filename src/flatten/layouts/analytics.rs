use crate::error::RecordError;
use crate::flatten::layouts::RowLayout;
use crate::flatten::types::{ColumnGroup, Expansion, RowDraft};
use crate::source::Record;
use crate::value::format_json;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

const GROUPS: &[ColumnGroup] = &[
    ColumnGroup {
        name: "event_params",
        prefix: "param_",
    },
    ColumnGroup {
        name: "user_properties",
        prefix: "user_prop_",
    },
];

const COLUMNS: &[&str] = &[
    "event_date",
    "event_timestamp",
    "event_name",
    "event_previous_timestamp",
    "event_bundle_sequence_id",
    "event_server_timestamp_offset",
    "user_pseudo_id",
    "user_first_touch_timestamp",
    "device_category",
    "device_mobile_brand_name",
    "device_mobile_model_name",
    "device_mobile_marketing_name",
    "device_mobile_os_hardware_model",
    "device_operating_system",
    "device_operating_system_version",
    "device_advertising_id",
    "device_language",
    "device_is_limited_ad_tracking",
    "device_time_zone_offset_seconds",
    "geo_city",
    "geo_country",
    "geo_continent",
    "geo_region",
    "geo_sub_continent",
    "geo_metro",
    "app_info_id",
    "app_info_version",
    "app_info_firebase_app_id",
    "app_info_install_source",
    "traffic_source_medium",
    "traffic_source_source",
    "stream_id",
    "platform",
    "is_active_user",
    "batch_event_index",
    "privacy_analytics_storage",
    "privacy_ads_storage",
    "privacy_uses_transient_token",
];

/// Mobile analytics export: one event per record, one row per event
///
/// `event_params` and `user_properties` are key/value lists; each distinct
/// key becomes a `param_<key>` or `user_prop_<key>` column.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticsLayout;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalyticsEvent {
    event_date: Value,
    event_timestamp: Value,
    event_name: Value,
    event_params: Option<Vec<Value>>,
    event_previous_timestamp: Value,
    event_bundle_sequence_id: Value,
    event_server_timestamp_offset: Value,
    user_pseudo_id: Value,
    privacy_info: Option<PrivacyInfo>,
    user_properties: Option<Vec<Value>>,
    user_first_touch_timestamp: Value,
    device: Option<Device>,
    geo: Option<Geo>,
    app_info: Option<AppInfo>,
    traffic_source: Option<TrafficSource>,
    stream_id: Value,
    platform: Value,
    is_active_user: Value,
    batch_event_index: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Device {
    category: Value,
    mobile_brand_name: Value,
    mobile_model_name: Value,
    mobile_marketing_name: Value,
    mobile_os_hardware_model: Value,
    operating_system: Value,
    operating_system_version: Value,
    advertising_id: Value,
    language: Value,
    is_limited_ad_tracking: Value,
    time_zone_offset_seconds: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Geo {
    city: Value,
    country: Value,
    continent: Value,
    region: Value,
    sub_continent: Value,
    metro: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AppInfo {
    id: Value,
    version: Value,
    firebase_app_id: Value,
    install_source: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrafficSource {
    medium: Value,
    source: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PrivacyInfo {
    analytics_storage: Value,
    ads_storage: Value,
    uses_transient_token: Value,
}

/// One entry of `event_params` or `user_properties`
#[derive(Debug, Deserialize)]
struct Parameter {
    key: String,
    #[serde(default)]
    value: Option<ParameterValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ParameterValue {
    string_value: Value,
    int_value: Value,
    float_value: Value,
    double_value: Value,
}

impl ParameterValue {
    /// The first typed slot that is set
    fn format(&self) -> String {
        [
            &self.string_value,
            &self.int_value,
            &self.float_value,
            &self.double_value,
        ]
        .into_iter()
        .find(|value| !value.is_null())
        .map(format_json)
        .unwrap_or_default()
    }
}

impl RowLayout for AnalyticsLayout {
    fn name(&self) -> &'static str {
        "analytics"
    }

    fn fixed_columns(&self) -> Vec<&'static str> {
        COLUMNS.to_vec()
    }

    fn groups(&self) -> &'static [ColumnGroup] {
        GROUPS
    }

    fn expand(&self, record: &Record) -> Result<Expansion, RecordError> {
        let event: AnalyticsEvent = record.parse()?;
        let mut expansion = Expansion::default();

        let device = event.device.unwrap_or_default();
        let geo = event.geo.unwrap_or_default();
        let app_info = event.app_info.unwrap_or_default();
        let traffic_source = event.traffic_source.unwrap_or_default();
        let privacy = event.privacy_info.unwrap_or_default();

        let row: Vec<String> = [
            &event.event_date,
            &event.event_timestamp,
            &event.event_name,
            &event.event_previous_timestamp,
            &event.event_bundle_sequence_id,
            &event.event_server_timestamp_offset,
            &event.user_pseudo_id,
            &event.user_first_touch_timestamp,
            &device.category,
            &device.mobile_brand_name,
            &device.mobile_model_name,
            &device.mobile_marketing_name,
            &device.mobile_os_hardware_model,
            &device.operating_system,
            &device.operating_system_version,
            &device.advertising_id,
            &device.language,
            &device.is_limited_ad_tracking,
            &device.time_zone_offset_seconds,
            &geo.city,
            &geo.country,
            &geo.continent,
            &geo.region,
            &geo.sub_continent,
            &geo.metro,
            &app_info.id,
            &app_info.version,
            &app_info.firebase_app_id,
            &app_info.install_source,
            &traffic_source.medium,
            &traffic_source.source,
            &event.stream_id,
            &event.platform,
            &event.is_active_user,
            &event.batch_event_index,
            &privacy.analytics_storage,
            &privacy.ads_storage,
            &privacy.uses_transient_token,
        ]
        .into_iter()
        .map(format_json)
        .collect();

        let params = parameters(
            "event_params",
            event.event_params.as_deref().unwrap_or_default(),
            &mut expansion.warnings,
        );
        let user_props = parameters(
            "user_properties",
            event.user_properties.as_deref().unwrap_or_default(),
            &mut expansion.warnings,
        );

        expansion.rows.push(
            RowDraft::new(row)
                .with_group(params)
                .with_group(user_props),
        );

        Ok(expansion)
    }
}

/// Collect a key/value list; on a repeated key the last entry wins
fn parameters(
    collection: &'static str,
    entries: &[Value],
    warnings: &mut Vec<RecordError>,
) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for (index, entry) in entries.iter().enumerate() {
        match Parameter::deserialize(entry) {
            Ok(param) => {
                let value = param.value.map(|v| v.format()).unwrap_or_default();
                values.insert(param.key, value);
            }
            Err(_) => warnings.push(RecordError::MalformedDynamic {
                collection,
                index,
                field: "key",
            }),
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::plan::ColumnPlan;
    use crate::flatten::types::FlattenConfig;
    use serde_json::json;

    fn event_line(params: Value, props: Value) -> Record {
        let line = json!({
            "event_date": "20240101",
            "event_timestamp": "1704067200000000",
            "event_name": "level_up",
            "event_params": params,
            "user_pseudo_id": "u1",
            "user_properties": props,
            "device": {"category": "mobile", "operating_system": "iOS", "time_zone_offset_seconds": 3600.0},
            "geo": {"country": "France"},
            "app_info": {"id": "com.example", "version": "1.0"},
            "traffic_source": null,
            "privacy_info": {"analytics_storage": "Yes"},
            "is_active_user": true
        });
        Record::payload(line.to_string())
    }

    #[test]
    fn test_fixed_columns_are_filled() {
        let layout = AnalyticsLayout;
        let expansion = layout.expand(&event_line(json!([]), json!(null))).unwrap();
        let row = &expansion.rows[0].fixed;

        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(COLUMNS.len(), 38);

        let cell = |name: &str| {
            let index = COLUMNS.iter().position(|c| *c == name).unwrap();
            row[index].as_str()
        };
        assert_eq!(cell("event_name"), "level_up");
        assert_eq!(cell("device_operating_system"), "iOS");
        assert_eq!(cell("device_time_zone_offset_seconds"), "3600");
        assert_eq!(cell("geo_country"), "France");
        assert_eq!(cell("traffic_source_medium"), "");
        assert_eq!(cell("is_active_user"), "true");
        assert_eq!(cell("privacy_analytics_storage"), "Yes");
        assert_eq!(cell("privacy_ads_storage"), "");
    }

    #[test]
    fn test_params_and_user_properties_become_columns() {
        let records = vec![
            event_line(
                json!([
                    {"key": "level", "value": {"int_value": 4}},
                    {"key": "score", "value": {"double_value": 12.5}}
                ]),
                json!([{"key": "tier", "value": {"string_value": "gold", "set_timestamp_micros": 1}}]),
            ),
            event_line(
                json!([{"key": "area", "value": {"string_value": "forest"}}]),
                json!([]),
            ),
        ];

        let layout = AnalyticsLayout;
        let plan = ColumnPlan::discover(&records, &layout, &FlattenConfig::default());
        assert_eq!(
            &plan.header()[38..],
            ["param_area", "param_level", "param_score", "user_prop_tier"]
        );

        let first = plan.assemble(layout.expand(&records[0]).unwrap().rows.remove(0));
        assert_eq!(&first[38..], ["", "4", "12.5", "gold"]);

        let second = plan.assemble(layout.expand(&records[1]).unwrap().rows.remove(0));
        assert_eq!(&second[38..], ["forest", "", "", ""]);
    }

    #[test]
    fn test_first_set_value_slot_wins() {
        let value = ParameterValue {
            int_value: json!("17"),
            double_value: json!(1.5),
            ..ParameterValue::default()
        };
        assert_eq!(value.format(), "17");
        assert_eq!(ParameterValue::default().format(), "");
    }

    #[test]
    fn test_malformed_parameter_is_reported() {
        let expansion = AnalyticsLayout
            .expand(&event_line(json!([{"value": {}}, {"key": "ok"}]), json!(null)))
            .unwrap();

        assert_eq!(expansion.warnings.len(), 1);
        assert_eq!(expansion.rows[0].dynamic[0].get("ok").map(String::as_str), Some(""));
    }
}
