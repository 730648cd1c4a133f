// ==========================================
// 建筑工作室 S 曲线引擎 - 投影配置读取 Trait
// ==========================================
// 职责: 定义投影引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::NegativeCostPolicy;
use crate::engine::projector::ProjectionConfig;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ProjectionConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ProjectionConfigReader: Send + Sync {
    /// 日分摊上限（天）
    ///
    /// # 默认值
    /// - 730
    async fn get_horizon_days(&self) -> Result<usize, Box<dyn Error>>;

    /// 曲线尾部空周数
    ///
    /// # 默认值
    /// - 4
    async fn get_trailing_buffer_weeks(&self) -> Result<u32, Box<dyn Error>>;

    /// 负造价叶子处理策略
    ///
    /// # 默认值
    /// - PERMISSIVE
    async fn get_negative_cost_policy(&self) -> Result<NegativeCostPolicy, Box<dyn Error>>;
}

/// 通过读取器组装完整的投影配置
pub async fn load_projection_config<R: ProjectionConfigReader + ?Sized>(
    reader: &R,
) -> Result<ProjectionConfig, Box<dyn Error>> {
    Ok(ProjectionConfig {
        horizon_days: reader.get_horizon_days().await?,
        trailing_buffer_weeks: reader.get_trailing_buffer_weeks().await?,
        negative_cost_policy: reader.get_negative_cost_policy().await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReader;

    #[async_trait]
    impl ProjectionConfigReader for FixedReader {
        async fn get_horizon_days(&self) -> Result<usize, Box<dyn Error>> {
            Ok(365)
        }

        async fn get_trailing_buffer_weeks(&self) -> Result<u32, Box<dyn Error>> {
            Ok(2)
        }

        async fn get_negative_cost_policy(&self) -> Result<NegativeCostPolicy, Box<dyn Error>> {
            Ok(NegativeCostPolicy::Reject)
        }
    }

    #[tokio::test]
    async fn test_load_projection_config_from_reader() {
        let config = load_projection_config(&FixedReader).await.unwrap();
        assert_eq!(config.horizon_days, 365);
        assert_eq!(config.trailing_buffer_weeks, 2);
        assert_eq!(config.negative_cost_policy, NegativeCostPolicy::Reject);
    }
}
