// ==========================================
// 同步 API 调用异步组件的桥接
// ==========================================
// - 多线程运行时内: block_in_place + handle.block_on
// - 单线程运行时内: 无法 block_in_place，直接在当前线程轮询
// - 运行时外: 临时创建 Runtime
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use std::future::Future;
use tokio::runtime::{Handle, RuntimeFlavor};

pub(crate) fn run_blocking<F: Future>(future: F) -> ApiResult<F::Output> {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            Ok(tokio::task::block_in_place(|| handle.block_on(future)))
        }
        Ok(_) => Ok(futures::executor::block_on(future)),
        Err(_) => {
            let runtime = tokio::runtime::Runtime::new()
                .map_err(|e| ApiError::InternalError(format!("创建异步运行时失败: {}", e)))?;
            Ok(runtime.block_on(future))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_runtime() {
        assert_eq!(run_blocking(async { 7 }).unwrap(), 7);
    }

    #[tokio::test]
    async fn test_inside_current_thread_runtime() {
        assert_eq!(run_blocking(async { 8 }).unwrap(), 8);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_inside_multi_thread_runtime() {
        assert_eq!(run_blocking(async { 9 }).unwrap(), 9);
    }
}
