//! Fuzz target: `DispatchContext::handle_command`
//!
//! Interprets the input as a header followed by a payload and dispatches
//! it against a small registered table.  Whatever the input, the response
//! packet must hold a well-formed response for the same ids.
//!
//! cargo fuzz run fuzz_dispatch

#![no_main]

use cmdcore::dispatch::{Command, CommandModule, DispatchContext, Subsystem};
use cmdcore::protocol::{Header, MessageType};
use cmdcore::DispatchConfig;
use libfuzzer_sys::fuzz_target;

fn reply(ctx: &mut DispatchContext) {
    let h = ctx.command_packet().header();
    let len = ctx.command_payload().len().min(8);
    let rsp = Header::command(h.device_type(), h.class_id(), h.command_id(), 2 + len);
    ctx.create_response(rsp).set_result(0);
}

fn silent(_ctx: &mut DispatchContext) {}

static COMMANDS: [Command; 2] = [Command::new(0x00, reply), Command::new(0x01, silent)];
static MODULE: CommandModule = CommandModule::new(0x01, "fuzz", &COMMANDS);
static TABLE: [&CommandModule; 1] = [&MODULE];

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let header = Header::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let payload = &data[4..];

    let Ok(mut ctx) = DispatchContext::new(DispatchConfig::default()) else {
        return;
    };
    ctx.register(&Subsystem::new(0x20, "fuzz", &TABLE, &TABLE));
    ctx.handle_command(header, payload);

    let rsp = ctx.response_packet().header();
    assert!(!rsp.is_sentinel());
    assert_eq!(rsp.message_type(), MessageType::CommandResponse);
    assert_eq!(rsp.class_id(), header.class_id());
    assert_eq!(rsp.command_id(), header.command_id());
    assert!(rsp.payload_len() <= ctx.config().max_payload());
});
