//! The shipped example configuration stays loadable.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;

use common::{RecordingTransport, at};
use dotmate::config::Config;
use dotmate::renderers::{self, RenderContext};
use dotmate::schedule::clock::ManualClock;
use dotmate::schedule::{EntryState, ScheduleEngine};

const EXAMPLE: &str = include_str!("../config.example.yaml");

#[test]
fn test_example_params_satisfy_contracts() {
    let config = Config::from_yaml(EXAMPLE).unwrap();
    let registry = renderers::default_registry();

    for device in &config.devices {
        for spec in &device.schedules {
            let entry = registry.resolve(&spec.kind).unwrap();
            entry
                .contract
                .validate(&spec.kind, &spec.params)
                .unwrap_or_else(|e| panic!("{} / {}: {}", device.name, spec.kind, e));
        }
    }
}

#[tokio::test]
async fn test_example_loads_into_engine() {
    let config = Config::from_yaml(EXAMPLE).unwrap();
    // Friday evening: the weekday work schedule resumes on Monday.
    let clock = Arc::new(ManualClock::new(at(2024, 1, 5, 19, 0)));
    let engine = ScheduleEngine::new(
        Arc::new(renderers::default_registry()),
        Arc::new(RecordingTransport::default()),
        RenderContext::offline().with_clock(clock),
    );

    assert_eq!(engine.load(&config.devices).unwrap(), 4);

    let entries = engine.entries();
    assert_eq!(entries.len(), 5);
    let work = entries.iter().find(|e| e.kind == "work").unwrap();
    assert_eq!(work.next_fire, Some(at(2024, 1, 8, 9, 0)));
    let text = entries.iter().find(|e| e.kind == "text").unwrap();
    assert_eq!(text.state, EntryState::Pending);
}
