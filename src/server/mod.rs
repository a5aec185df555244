// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server API.
//!
//! A server owns one transport and dispatches every decoded request
//! to a [`Service`]. Service errors are Modbus exceptions and are
//! serialized in place of a regular response; the serve loops are
//! long-lived and treat line noise, foreign stations and broken
//! checksums as conditions to skip, not reasons to exit.

#[cfg(feature = "ascii")]
pub mod ascii;

#[cfg(feature = "rtu")]
pub mod rtu;

#[cfg(feature = "tcp")]
pub mod tcp;

pub mod stats;

pub mod store;

use std::{future::Future, io, sync::Arc};

use async_trait::async_trait;
use tokio::{sync::watch, task::JoinHandle};

use crate::frame::{Exception, Response, SlaveRequest};

/// A Modbus server service.
#[async_trait]
pub trait Service: Send + Sync {
    /// Handles one request. An `Err` is answered with the exception
    /// in place of a regular response.
    async fn call(&self, request: SlaveRequest) -> Result<Response, Exception>;
}

#[async_trait]
impl<S: Service + ?Sized> Service for Arc<S> {
    async fn call(&self, request: SlaveRequest) -> Result<Response, Exception> {
        (**self).call(request).await
    }
}

#[async_trait]
impl<S: Service + ?Sized> Service for Box<S> {
    async fn call(&self, request: SlaveRequest) -> Result<Response, Exception> {
        (**self).call(request).await
    }
}

/// Handle to a server worker spawned onto the runtime.
///
/// Starting is a consuming operation on the respective server, so a
/// worker cannot be started twice. Dropping the handle detaches the
/// worker; [`stop`](Self::stop) shuts it down and waits for it.
#[derive(Debug)]
pub struct ServerHandle {
    shutdown: watch::Sender<bool>,
    worker: Option<JoinHandle<io::Result<()>>>,
}

impl ServerHandle {
    pub(crate) fn spawn_with<F, Fut>(serve: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = io::Result<()>> + Send + 'static,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker = tokio::spawn(serve(shutdown_rx));
        Self {
            shutdown,
            worker: Some(worker),
        }
    }

    /// Checks whether the worker is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Signals the worker to shut down and waits for it to return.
    /// The transport closes when the worker drops it. Stopping twice
    /// is a no-op.
    pub async fn stop(&mut self) -> io::Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let _ = self.shutdown.send(true);
        worker
            .await
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?
    }
}

pub(crate) async fn shutdown_requested(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
