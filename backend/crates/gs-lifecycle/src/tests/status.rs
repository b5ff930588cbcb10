use crate::tests::{FakeChannel, Harness, TWO_PLAYER_ROSTER};
use crate::{ControllerSettings, IdleMonitor, ServerState, ServerStatus};

use std::sync::Arc;
use std::time::Duration;

use googletest::assert_that;
use googletest::prelude::{contains_substring, eq, none, some};

#[tokio::test(start_paused = true)]
async fn given_fresh_controller_when_collect_then_unknown_snapshot() {
    // Given
    let harness = Harness::new();

    // When
    let status = ServerStatus::collect(&harness.controller, None);

    // Then
    assert_that!(status.state, eq(ServerState::Stopped));
    assert_that!(status.server, none());
    assert_that!(status.stop_event_running, eq(false));
    assert_that!(status.idle_remaining_secs, none());
}

#[tokio::test(start_paused = true)]
async fn given_occupancy_and_idle_timer_when_collect_then_reported_without_query() {
    // Given
    let harness = Harness::with(
        ControllerSettings::default(),
        FakeChannel::new(TWO_PLAYER_ROSTER),
    );
    harness.supervisor.set_running(true);
    harness.controller.probe().await;
    harness.controller.refresh_server_info().await.unwrap();
    harness.channel.set_default("name,playeruid,steamid\n");
    let monitor = IdleMonitor::new(
        Arc::clone(&harness.controller),
        Duration::from_secs(600),
        Duration::from_secs(30),
    );
    monitor.tick().await;
    let queries_before = harness.channel.commands().len();

    // When
    let status = ServerStatus::collect(&harness.controller, Some(&monitor));

    // Then
    assert_that!(status.state, eq(ServerState::Running));
    assert_that!(status.idle_remaining_secs, some(eq(600)));
    assert_that!(
        status.server.as_ref().map(|s| s.player_count),
        some(eq(0))
    );
    assert_that!(harness.channel.commands().len(), eq(queries_before));
}

#[tokio::test(start_paused = true)]
async fn given_status_when_to_json_then_snake_case_state() {
    // Given
    let harness = Harness::new();
    let status = harness.controller.status(None);

    // When
    let json = status.to_json().unwrap();

    // Then
    assert_that!(json, contains_substring("\"state\":\"stopped\""));
    assert_that!(json, contains_substring("\"server\":null"));
    assert_that!(json, contains_substring("\"checked_at\""));
}
