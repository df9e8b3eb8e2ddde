use super::ComponentClass;
use ahash::AHashMap;
use serde_json::{Map, json};

/// Declares the built-in component classes with their configuration defaults.
macro_rules! define_component_classes {
    (
        $(
            $tag:literal => $class:literal $( { $( $key:literal : $value:expr ),* $(,)? } )?
        ),* $(,)?
    ) => {
        pub(super) fn register_default_classes(classes: &mut AHashMap<String, ComponentClass>) {
            $(
                #[allow(unused_mut)]
                let mut defaults = Map::new();
                $( $( defaults.insert($key.to_string(), json!($value)); )* )?
                classes.insert(
                    $tag.to_string(),
                    ComponentClass {
                        class_name: $class.to_string(),
                        defaults,
                    },
                );
            )*
        }
    };
}

define_component_classes! {
    "mock_device" => "MockDeviceComponent" {
        "broker_host": "localhost",
        "broker_port": 1883,
        "topic": "sensors/mock",
        "wave_type": "sine",
        "interval_ms": 1000,
    },
    "mqtt_subscribe" => "MQTTSubscriberComponent" {
        "broker_host": "localhost",
        "broker_port": 1883,
        "topic": "sensors/#",
    },
    "mqtt_publish" => "MQTTPublisherComponent" {
        "broker_host": "localhost",
        "broker_port": 1883,
        "topic": "output/data",
    },
    "math" => "MathOperationComponent" {
        "operation": "scale",
        "scale": 1.0,
        "offset": 0,
    },
    "scale" => "MathOperationComponent" {
        "operation": "scale",
        "scale": 1.0,
        "offset": 0,
    },
    "compare" => "CompareComponent",
    "threshold_alarm" => "ThresholdAlarmComponent",
    "custom_script" => "CustomScriptComponent",
    "csv_write" => "CSVStorageComponent" {
        "file_path": "./data/output.csv",
        "include_timestamp": true,
    },
    "csv_storage" => "CSVStorageComponent" {
        "file_path": "./data/output.csv",
        "include_timestamp": true,
    },
    "debug_print" => "DebugPrintComponent",
    "timer" => "TimerComponent",
    "conditional" => "ConditionalComponent",
    "global_variable" => "GlobalVariableComponent",
    "data_probe" => "DataProbeComponent",
}
