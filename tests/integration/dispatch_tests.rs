//! Integration tests: routing, error responses, delegate, sensitivity.

use crate::mock_subsystems::*;
use cmdcore::dispatch::{default_delegate, CommandHandler, DispatchContext};
use cmdcore::error::Error;
use cmdcore::protocol::{Header, LengthFieldWidth, MessageType};
use cmdcore::DispatchConfig;

fn context() -> DispatchContext {
    let mut ctx = DispatchContext::new(DispatchConfig::default()).unwrap();
    ctx.start(&radio_subsystem()).unwrap();
    take_calls();
    ctx
}

fn assert_error_response(ctx: &DispatchContext, original: Header, error: Error) {
    let h = ctx.response_packet().header();
    assert_eq!(h.device_type(), original.device_type());
    assert_eq!(h.class_id(), original.class_id());
    assert_eq!(h.command_id(), original.command_id());
    assert_eq!(h.message_type(), MessageType::CommandResponse);
    assert_eq!(h.payload_len(), 2);
    assert_eq!(ctx.response_result(), error.code());
}

#[test]
fn echo_round_trip() {
    let mut ctx = context();
    ctx.handle_command(Header::command(RADIO_DEV, SYSTEM_CLASS, ECHO_ID, 3), &[1, 2, 3]);
    let rsp = ctx.response_packet();
    assert_eq!(rsp.header().payload_len(), ECHO_FIXED_LEN + 3);
    assert_eq!(rsp.result(), 0);
    assert_eq!(rsp.array_len(LengthFieldWidth::U8, ECHO_FIXED_LEN), Some(3));
    assert_eq!(&rsp.payload()[ECHO_FIXED_LEN..], &[1, 2, 3]);
    assert_eq!(take_calls(), ["echo"]);
}

#[test]
fn unregistered_device_is_not_supported() {
    let mut ctx = context();
    let h = Header::command(UNREGISTERED_DEV, SYSTEM_CLASS, ECHO_ID, 0);
    ctx.handle_command(h, &[]);
    assert_error_response(&ctx, h, Error::NotSupported);
    assert!(take_calls().is_empty());
}

#[test]
fn unknown_class_is_not_supported() {
    let mut ctx = context();
    let h = Header::command(RADIO_DEV, 0x7E, ECHO_ID, 0);
    ctx.handle_command(h, &[]);
    assert_error_response(&ctx, h, Error::NotSupported);
}

#[test]
fn missing_command_id_copies_header_fields() {
    let mut ctx = context();
    let h = Header::command(RADIO_DEV, SYSTEM_CLASS, 0x55, 4);
    ctx.handle_command(h, &[9, 9, 9, 9]);
    assert_error_response(&ctx, h, Error::NotSupported);
    assert!(take_calls().is_empty());
}

#[test]
fn handler_without_response_is_failure() {
    let mut ctx = context();
    let h = Header::command(RADIO_DEV, SYSTEM_CLASS, SILENT_ID, 0);
    ctx.handle_command(h, &[]);
    assert_error_response(&ctx, h, Error::Failure);
    assert_eq!(take_calls(), ["silent"]);
}

#[test]
fn active_table_switches_with_lifecycle() {
    let mut ctx = DispatchContext::new(DispatchConfig::default()).unwrap();
    let radio = radio_subsystem();
    ctx.register(&radio);

    // Stopped: only the boot module answers class 1.
    let version = Header::command(RADIO_DEV, SYSTEM_CLASS, VERSION_ID, 0);
    ctx.handle_command(version, &[]);
    assert_eq!(ctx.response_result(), 0);
    assert_eq!(&ctx.response_packet().payload()[2..], &[1, 7]);

    let echo = Header::command(RADIO_DEV, SYSTEM_CLASS, ECHO_ID, 0);
    ctx.handle_command(echo, &[]);
    assert_error_response(&ctx, echo, Error::NotSupported);

    ctx.start(&radio).unwrap();
    ctx.handle_command(version, &[]);
    assert_error_response(&ctx, version, Error::NotSupported);
    ctx.handle_command(echo, &[]);
    assert_eq!(ctx.response_result(), 0);
}

#[test]
fn sensitivity_follows_table_metadata() {
    let ctx = context();
    assert!(ctx.is_sensitive(Header::command(RADIO_DEV, SYSTEM_CLASS, SECRET_ID, 0)));
    assert!(!ctx.is_sensitive(Header::command(RADIO_DEV, SYSTEM_CLASS, ECHO_ID, 0)));
    assert!(!ctx.is_sensitive(Header::command(UNREGISTERED_DEV, SYSTEM_CLASS, SECRET_ID, 0)));
}

#[test]
fn nested_raw_command_runs_inside_handler() {
    let mut ctx = context();
    let h = Header::command(RADIO_DEV, SYSTEM_CLASS, NESTED_ID, 0);
    ctx.handle_command(h, &[]);
    assert_eq!(take_calls(), ["nested", "echo"]);
    let rsp = ctx.response_packet();
    assert_eq!(rsp.header().command_id(), NESTED_ID);
    assert_eq!(rsp.payload()[2] as usize, ECHO_FIXED_LEN + 2);
}

// ── Delegate interception ─────────────────────────────────────

const DENIED: Error = Error::Code(0x0101);

fn deny_sensitive(ctx: &mut DispatchContext, header: Header, handler: Option<CommandHandler>) {
    record("delegate");
    if ctx.is_sensitive(header) {
        ctx.create_response(header).set_error(header, DENIED);
        return;
    }
    default_delegate(ctx, header, handler);
}

#[test]
fn custom_delegate_intercepts_every_command() {
    let mut ctx = context();
    ctx.set_delegate(deny_sensitive);

    let secret = Header::command(RADIO_DEV, SYSTEM_CLASS, SECRET_ID, 0);
    ctx.handle_command(secret, &[]);
    assert_eq!(ctx.response_result(), DENIED.code());
    assert_eq!(take_calls(), ["delegate"]);

    let echo = Header::command(RADIO_DEV, SYSTEM_CLASS, ECHO_ID, 1);
    ctx.handle_command(echo, &[5]);
    assert_eq!(ctx.response_result(), 0);
    assert_eq!(take_calls(), ["delegate", "echo"]);

    ctx.reset_delegate();
    ctx.handle_command(secret, &[]);
    assert_eq!(ctx.response_result(), 0);
    assert_eq!(take_calls(), ["secret"]);
}

#[test]
fn handler_override_bypasses_lookup() {
    let mut ctx = context();
    // Nothing is registered under this device type.
    let h = Header::command(UNREGISTERED_DEV, 0x09, 0x09, 0);
    default_delegate(&mut ctx, h, Some(respond_ok));
    assert_eq!(ctx.response_result(), 0);
    assert_eq!(ctx.response_packet().header().device_type(), UNREGISTERED_DEV);
}

#[test]
fn handler_may_queue_events() {
    let mut ctx = context();
    ctx.handle_command(Header::command(RADIO_DEV, SYSTEM_CLASS, NOTIFY_ID, 0), &[]);
    assert_eq!(ctx.response_result(), 0);
    let frame = ctx.events().pop().unwrap();
    let h = Header::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
    assert_eq!(h.message_type(), MessageType::Event);
    assert_eq!(&frame[4..], &[0xEE]);
}
