pub mod build;
pub mod config;
pub mod index;
pub mod init;
pub mod stage;
pub mod status;

use anyhow::Context;
use std::future::Future;

/// Drive a future to completion from synchronous command code.
///
/// Commands run on the main thread without a runtime; when one already
/// exists (e.g. under `#[tokio::test]`) it is reused.
pub fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(tokio::task::block_in_place(|| handle.block_on(fut))),
        Err(_) => {
            tracing::debug!("using new tokio runtime");
            let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
            Ok(rt.block_on(fut))
        }
    }
}
