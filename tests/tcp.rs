// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TCP end-to-end exchanges over loopback sockets.

use std::time::Duration;

use tokio::{
    io::{AsyncReadExt as _, AsyncWriteExt as _},
    net::{TcpListener, TcpStream},
};

use modbus_link::{
    client::{tcp, Reader as _, Writer as _},
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

fn register_service() -> RegisterService {
    let service = RegisterService::new(small_config());
    {
        let registers = service.registers();
        let mut registers = registers.write().unwrap();
        registers.write_multiple_registers(0, &[6, 5]).unwrap();
    }
    service
}

#[tokio::test]
async fn read_holding_registers_end_to_end() {
    let server = modbus_link::server::tcp::Server::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let server_addr = server.local_addr().unwrap();
    let stats = server.stats();
    let mut handle = server.spawn(register_service());

    let mut ctx = tcp::connect(server_addr).await.unwrap();
    let words = ctx.read_holding_registers(0, 2).await.unwrap();
    assert_eq!(words, vec![6, 5]);

    assert_eq!(stats.snapshot().read_holding_registers, 1);

    handle.stop().await.unwrap();
    assert!(!handle.is_running());
}

#[tokio::test]
async fn first_exchange_uses_exact_wire_bytes() {
    let server = modbus_link::server::tcp::Server::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let server_addr = server.local_addr().unwrap();
    let mut handle = server.spawn(register_service());

    let mut stream = TcpStream::connect(server_addr).await.unwrap();
    stream
        .write_all(&[
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x02,
        ])
        .await
        .unwrap();

    let mut response = [0u8; 13];
    stream.read_exact(&mut response).await.unwrap();
    assert_eq!(
        response,
        [0x00, 0x01, 0x00, 0x00, 0x00, 0x07, 0x01, 0x03, 0x04, 0x00, 0x06, 0x00, 0x05]
    );

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn transaction_ids_increase_monotonically() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    let peer = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut transaction_ids = Vec::new();
        for _ in 0..2 {
            let mut request = [0u8; 12];
            stream.read_exact(&mut request).await.unwrap();
            transaction_ids.push(u16::from_be_bytes([request[0], request[1]]));
            // A WriteSingleRegister response echoes the request.
            stream.write_all(&request).await.unwrap();
        }
        transaction_ids
    });

    let mut ctx = tcp::connect(server_addr).await.unwrap();
    ctx.write_single_register(7, 0xABCD).await.unwrap();
    ctx.write_single_register(7, 0xABCD).await.unwrap();

    assert_eq!(peer.await.unwrap(), vec![1, 2]);
}

#[tokio::test]
async fn out_of_range_read_yields_illegal_data_address() {
    let server = modbus_link::server::tcp::Server::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let server_addr = server.local_addr().unwrap();
    let mut handle = server.spawn(RegisterService::new(small_config()));

    let mut ctx = tcp::connect(server_addr).await.unwrap();
    let err = ctx.read_holding_registers(15, 2).await.unwrap_err();
    let Error::Exception(rsp) = err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(rsp.function, 0x03);
    assert_eq!(rsp.exception, Exception::IllegalDataAddress);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn unsupported_function_code_yields_illegal_function() {
    let server = modbus_link::server::tcp::Server::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let server_addr = server.local_addr().unwrap();
    let mut handle = server.spawn(register_service());

    let mut stream = TcpStream::connect(server_addr).await.unwrap();
    stream
        .write_all(&[0x00, 0x07, 0x00, 0x00, 0x00, 0x04, 0x01, 0x2B, 0x0E, 0x01])
        .await
        .unwrap();

    let mut response = [0u8; 9];
    stream.read_exact(&mut response).await.unwrap();
    assert_eq!(
        response,
        [0x00, 0x07, 0x00, 0x00, 0x00, 0x03, 0x01, 0xAB, 0x01]
    );

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn each_connection_is_served_independently() {
    let server = modbus_link::server::tcp::Server::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let server_addr = server.local_addr().unwrap();
    let mut handle = server.spawn(register_service());

    let mut first = tcp::connect(server_addr).await.unwrap();
    let mut second = tcp::connect(server_addr).await.unwrap();

    assert_eq!(first.read_holding_registers(0, 1).await.unwrap(), vec![6]);
    // Dropping one connection must not affect the other.
    first.disconnect().await.unwrap();
    assert_eq!(second.read_holding_registers(1, 1).await.unwrap(), vec![5]);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn connect_failure_is_a_typed_error() {
    // Port 1 on loopback is almost certainly closed.
    let result = tcp::connect("127.0.0.1:1".parse().unwrap()).await;
    assert!(matches!(result, Err(Error::Io(_))));
}

#[tokio::test]
async fn gateway_unit_id_is_used_in_the_header() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    let peer = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 12];
        stream.read_exact(&mut request).await.unwrap();
        stream.write_all(&request).await.unwrap();
        request[6]
    });

    let mut ctx = tcp::connect_slave(server_addr, Slave(0x2A)).await.unwrap();
    ctx.write_single_register(7, 0xABCD).await.unwrap();

    assert_eq!(peer.await.unwrap(), 0x2A);
}

#[tokio::test]
async fn stopped_server_refuses_new_connections() {
    let server = modbus_link::server::tcp::Server::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let server_addr = server.local_addr().unwrap();
    let mut handle = server.spawn(register_service());
    assert!(handle.is_running());

    handle.stop().await.unwrap();

    // The listening socket is gone; connecting either fails outright
    // or the accepted-then-closed stream yields an immediate error.
    match tcp::connect(server_addr).await {
        Err(_) => {}
        Ok(mut ctx) => {
            let result = tokio::time::timeout(
                Duration::from_millis(500),
                ctx.read_holding_registers(0, 1),
            )
            .await;
            assert!(!matches!(result, Ok(Ok(_))));
        }
    }
}
