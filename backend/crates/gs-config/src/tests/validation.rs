use crate::tests::{EnvGuard, setup_config_dir};
use crate::{Config, ControlConfig, CooldownConfig, IdleConfig, ProcessConfig, ServerConfig};

use googletest::assert_that;
use googletest::prelude::{anything, contains_substring, eq, err, ok};
use serial_test::serial;

// =========================================================================
// Validation Tests - Server
// =========================================================================

#[test]
#[serial]
fn given_port_zero_when_validate_then_error() {
    // Given
    let _temp = setup_config_dir();
    let _port = EnvGuard::set("GS_SERVER_PORT", "0");

    // When
    let config = Config::load().unwrap();
    let result = config.validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
fn given_invalid_ip_when_validate_then_error() {
    // Given
    let server = ServerConfig {
        ip: String::from("not-an-ip"),
        ..ServerConfig::default()
    };

    // When / Then
    assert_that!(server.validate(), err(anything()));
}

#[test]
fn given_valid_address_when_socket_addr_then_parsed() {
    // Given
    let server = ServerConfig {
        ip: String::from("127.0.0.1"),
        port: 8211,
    };

    // When
    let addr = server.socket_addr().unwrap();

    // Then
    assert_that!(addr.to_string().as_str(), eq("127.0.0.1:8211"));
}

// =========================================================================
// Validation Tests - Control channel
// =========================================================================

#[test]
fn given_client_args_without_command_placeholder_when_validate_then_error() {
    // Given
    let control = ControlConfig {
        client_args: vec![String::from("-a"), String::from("{host}:{port}")],
        ..ControlConfig::default()
    };

    // When
    let result = control.validate();

    // Then
    let err_msg = format!("{}", result.unwrap_err());
    assert_that!(err_msg, contains_substring("{command}"));
}

#[test]
fn given_zero_control_timeout_when_validate_then_error() {
    // Given
    let control = ControlConfig {
        timeout_secs: 0,
        ..ControlConfig::default()
    };

    // When / Then
    assert_that!(control.validate(), err(anything()));
}

// =========================================================================
// Validation Tests - Process
// =========================================================================

#[test]
fn given_blank_process_name_when_validate_then_error() {
    // Given
    let process = ProcessConfig {
        process_name: String::from("  "),
        ..ProcessConfig::default()
    };

    // When / Then
    assert_that!(process.validate(), err(anything()));
}

#[test]
fn given_empty_launch_path_when_validate_then_error() {
    // Given
    let process = ProcessConfig {
        launch_path: String::new(),
        ..ProcessConfig::default()
    };

    // When / Then
    assert_that!(process.validate(), err(anything()));
}

// =========================================================================
// Validation Tests - Idle stop and cooldowns
// =========================================================================

#[test]
fn given_zero_threshold_when_validate_then_error() {
    // Given
    let idle = IdleConfig {
        threshold_secs: 0,
        ..IdleConfig::default()
    };

    // When / Then
    assert_that!(idle.validate(), err(anything()));
}

#[test]
fn given_interval_longer_than_threshold_when_validate_then_ok() {
    // Given - allowed, only warned about
    let idle = IdleConfig {
        enabled: true,
        threshold_secs: 10,
        check_interval_secs: 30,
    };

    // When / Then
    assert_that!(idle.validate(), ok(anything()));
}

#[test]
fn given_stop_watch_timeout_below_poll_when_validate_then_error() {
    // Given
    let cooldown = CooldownConfig {
        stop_watch_poll_secs: 5,
        stop_watch_timeout_secs: 2,
        ..CooldownConfig::default()
    };

    // When / Then
    assert_that!(cooldown.validate(), err(anything()));
}

#[test]
fn given_zero_cooldowns_when_validate_then_ok() {
    // Given - cooldowns may be disabled entirely
    let cooldown = CooldownConfig {
        start_secs: 0,
        stop_secs: 0,
        ..CooldownConfig::default()
    };

    // When / Then
    assert_that!(cooldown.validate(), ok(anything()));
}
