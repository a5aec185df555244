// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTU end-to-end exchanges over an in-memory duplex transport.

use std::time::Duration;

use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

use modbus_link::{
    client::{rtu, Reader as _, Writer as _},
    server::store::{RegisterService, RegistersConfig},
    Error, Exception, Slave,
};

fn small_config() -> RegistersConfig {
    RegistersConfig {
        coils: 64,
        discrete_inputs: 64,
        holding_registers: 16,
        input_registers: 16,
    }
}

fn coil_service() -> RegisterService {
    let service = RegisterService::new(small_config());
    {
        let registers = service.registers();
        let mut registers = registers.write().unwrap();
        for offset in [11, 13, 18, 22] {
            registers.write_single_coil(offset, true).unwrap();
        }
    }
    service
}

/// The server drains stale input for up to 20 ms windows before
/// serving; tests must not write into that window.
async fn after_drain() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn server_answers_read_coils_with_exact_wire_bytes() {
    let (server_side, mut wire) = tokio::io::duplex(1024);
    let server = modbus_link::server::rtu::Server::new(server_side, Slave(4));
    let mut handle = server.spawn(coil_service());

    after_drain().await;
    wire.write_all(&[0x04, 0x01, 0x00, 0x0A, 0x00, 0x0D, 0xDD, 0x98])
        .await
        .unwrap();

    let mut response = [0u8; 7];
    wire.read_exact(&mut response).await.unwrap();
    assert_eq!(response, [0x04, 0x01, 0x02, 0x0A, 0x11, 0xB3, 0x50]);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn server_seeks_past_foreign_frame_bytes() {
    let (server_side, mut wire) = tokio::io::duplex(1024);
    let server = modbus_link::server::rtu::Server::new(server_side, Slave(4));
    let mut handle = server.spawn(coil_service());

    after_drain().await;
    // Two stray bytes of a frame for station 3, then our request,
    // then two trailing noise bytes.
    wire.write_all(&[
        0x03, 0x00, 0x04, 0x01, 0x00, 0x0A, 0x00, 0x0D, 0xDD, 0x98, 0x00, 0x00,
    ])
    .await
    .unwrap();

    let mut response = [0u8; 7];
    wire.read_exact(&mut response).await.unwrap();
    assert_eq!(response, [0x04, 0x01, 0x02, 0x0A, 0x11, 0xB3, 0x50]);

    // Exactly one response is emitted.
    let mut extra = [0u8; 1];
    let silence = tokio::time::timeout(Duration::from_millis(100), wire.read(&mut extra)).await;
    assert!(silence.is_err());

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn client_reads_coils_from_register_server() {
    let (server_side, client_side) = tokio::io::duplex(1024);
    let server = modbus_link::server::rtu::Server::new(server_side, Slave(4));
    let stats = server.stats();
    let mut handle = server.spawn(coil_service());

    after_drain().await;
    let mut ctx = rtu::attach_slave(client_side, Slave(4));
    let coils = ctx.read_coils(10, 13).await.unwrap();
    assert_eq!(coils.len(), 13);
    assert!(coils[1] && coils[3] && coils[8] && coils[12]);
    assert_eq!(coils.iter().filter(|&&coil| coil).count(), 4);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.requests, 1);
    assert_eq!(snapshot.read_coils, 1);

    handle.stop().await.unwrap();
    assert!(!handle.is_running());
}

#[tokio::test]
async fn client_request_bytes_and_echo_mismatch() {
    let (client_side, mut wire) = tokio::io::duplex(1024);
    let mut ctx = rtu::attach_slave(client_side, Slave(4));

    let call = tokio::spawn(async move { ctx.write_single_coil(10, true).await });

    let mut request = [0u8; 8];
    wire.read_exact(&mut request).await.unwrap();
    assert_eq!(request, [0x04, 0x05, 0x00, 0x0A, 0xFF, 0x00, 0xAC, 0x6D]);

    // Echo with the wrong value.
    wire.write_all(&[0x04, 0x05, 0x00, 0x0A, 0x00, 0x00, 0xED, 0x9D])
        .await
        .unwrap();

    let result = call.await.unwrap();
    assert!(matches!(result, Err(Error::ResponseValueMismatch)));
}

#[tokio::test]
async fn client_surfaces_exception_response_as_typed_error() {
    let (client_side, mut wire) = tokio::io::duplex(1024);
    let mut ctx = rtu::attach_slave(client_side, Slave(4));

    let call = tokio::spawn(async move { ctx.read_coils(10, 13).await });

    let mut request = [0u8; 8];
    wire.read_exact(&mut request).await.unwrap();

    wire.write_all(&[0x04, 0x81, 0x02, 0xD1, 0x90]).await.unwrap();

    let err = call.await.unwrap().unwrap_err();
    let Error::Exception(rsp) = err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(rsp.function, 0x01);
    assert_eq!(rsp.exception, Exception::IllegalDataAddress);
}

#[tokio::test]
async fn client_times_out_without_response() {
    let (client_side, mut wire) = tokio::io::duplex(1024);
    let mut ctx = rtu::attach_slave(client_side, Slave(4));
    ctx.set_response_timeout(Some(Duration::from_millis(50)));

    let call = tokio::spawn(async move { ctx.read_coils(0, 1).await });

    let mut request = [0u8; 8];
    wire.read_exact(&mut request).await.unwrap();
    // Never respond.

    let err = call.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Timeout));
}

#[tokio::test]
async fn server_answers_out_of_range_read_with_exception() {
    let (server_side, client_side) = tokio::io::duplex(1024);
    let server = modbus_link::server::rtu::Server::new(server_side, Slave(4));
    let mut handle = server.spawn(RegisterService::new(small_config()));

    after_drain().await;
    let mut ctx = rtu::attach_slave(client_side, Slave(4));
    let err = ctx.read_holding_registers(14, 8).await.unwrap_err();
    let Error::Exception(rsp) = err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(rsp.exception, Exception::IllegalDataAddress);

    handle.stop().await.unwrap();
}
