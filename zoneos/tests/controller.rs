use std::sync::Arc;

use zoneos::mock::{Call, CallLog, MockDeviceBuilder, Operation};
use zoneos::{Controller, ControllerError, Favorite, SpeakerDirectory, TrackInfo};

fn favorites() -> Vec<Favorite> {
  ["Morning Jazz", "BBC Radio 4", "Focus"]
    .iter()
    .enumerate()
    .map(|(i, title)| Favorite {
      title: title.to_string(),
      uri: format!("x-sonosapi-radio:station{}", i),
      metadata: String::new(),
      album_art: Some(format!("http://cdn.example/{}.png", i)),
    })
    .collect()
}

fn household(log: &CallLog) -> Arc<SpeakerDirectory> {
  Arc::new(
    vec![
      MockDeviceBuilder::new("Living Room")
        .favorites(favorites())
        .track(TrackInfo {
          title: "Blue in Green".to_string(),
          artist: "Miles Davis".to_string(),
          album: "Kind of Blue".to_string(),
          ..TrackInfo::default()
        })
        .build(log),
      MockDeviceBuilder::new("Kitchen").favorites(favorites()).volume(25).build(log),
      MockDeviceBuilder::new("Office").favorites(favorites()).volume(60).build(log),
    ]
    .into_iter()
    .collect(),
  )
}

#[test]
fn startup_groups_household_and_caches_favorites() {
  let log = CallLog::new();
  let controller = Controller::new(household(&log), true);

  assert_eq!(controller.list_speakers(), vec!["Living Room", "Kitchen", "Office"]);
  assert_eq!(controller.favorites().len(), 3);
  assert_eq!(controller.coordinator().unwrap().name(), "Living Room");

  let status = controller.group_status();
  assert_eq!(status.members.len(), 3);
  assert_eq!(status.volumes.get("Kitchen"), Some(&25));
  assert_eq!(status.volumes.get("Office"), Some(&60));
}

#[test]
fn favorites_cycle_on_the_coordinator() {
  let log = CallLog::new();
  let mut controller = Controller::new(household(&log), true);
  log.clear();

  controller.play_favorite_by_index(0).unwrap();
  controller.play_next_favorite().unwrap();
  controller.play_next_favorite().unwrap();
  controller.play_next_favorite().unwrap();

  let played: Vec<String> = log
    .calls()
    .into_iter()
    .filter(|call| call.operation == Operation::PlayUri)
    .map(|call| {
      assert_eq!(call.device, "Living Room");
      call.argument.unwrap_or_default()
    })
    .collect();
  assert_eq!(
    played,
    vec![
      "x-sonosapi-radio:station0",
      "x-sonosapi-radio:station1",
      "x-sonosapi-radio:station2",
      "x-sonosapi-radio:station0",
    ]
  );
}

#[test]
fn now_playing_follows_coordinator_changes() {
  let log = CallLog::new();
  let mut controller = Controller::new(household(&log), true);

  let track = controller.now_playing().unwrap().unwrap();
  assert_eq!(track.title, "Blue in Green");

  controller.remove_from_group("Living Room").unwrap();
  assert_eq!(controller.coordinator().unwrap().name(), "Kitchen");
  assert_eq!(controller.now_playing().unwrap(), Some(TrackInfo::default()));
}

#[test]
fn set_group_reports_failures_per_speaker() {
  let log = CallLog::new();
  let directory: SpeakerDirectory = vec![
    MockDeviceBuilder::new("A").build(&log),
    MockDeviceBuilder::new("B").failing(Operation::Join).build(&log),
  ]
  .into_iter()
  .collect();
  let mut controller = Controller::new(directory, false);

  let outcome = controller.set_group(["A", "B"]).unwrap();

  assert!(!outcome.is_applied());
  assert_eq!(outcome.failures().len(), 1);
  assert_eq!(outcome.failures()[0].name, "B");
  assert!(matches!(
    outcome.into_result(),
    Err(zoneos::GroupError::Reconciliation { .. })
  ));
}

#[test]
fn speaker_commands_reject_unknown_names() {
  let log = CallLog::new();
  let mut controller = Controller::new(household(&log), false);

  assert!(matches!(controller.volume("Garage"), Err(ControllerError::SpeakerNotFound(_))));
  assert!(matches!(
    controller.play_uri("Garage", "http://stream"),
    Err(ControllerError::SpeakerNotFound(_))
  ));
  assert!(matches!(
    controller.play_favorite("Garage", "Focus"),
    Err(ControllerError::SpeakerNotFound(_))
  ));
}

#[test]
fn play_uri_and_controls_reach_the_named_speaker() {
  let log = CallLog::new();
  let controller = Controller::new(household(&log), false);
  log.clear();

  controller.play_uri("Office", "http://radio.example/stream.mp3").unwrap();
  controller.control_playback("Office", "next").unwrap();
  assert_eq!(controller.set_volume("Office", 47).unwrap(), 45);

  assert_eq!(
    log.calls(),
    vec![
      Call::with_argument("Office", Operation::PlayUri, "http://radio.example/stream.mp3"),
      Call::new("Office", Operation::Next),
      Call::with_argument("Office", Operation::SetVolume, "45"),
    ]
  );
}
