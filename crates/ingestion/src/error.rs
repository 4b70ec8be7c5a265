//! Ingestion 错误类型

use contracts::ContractError;
use thiserror::Error;

/// 单次到达处理失败的原因
///
/// 这些错误不会越过 `frame_arrived` 边界：只用于日志与计数。
#[derive(Debug, Error)]
pub enum ArrivalError {
    /// 没有未获取的帧，或 reader 未处于启动状态
    #[error("no frame available")]
    FrameNotAvailable,

    /// 帧不包含视频载荷
    #[error("frame has no video media frame")]
    MissingVideoMediaFrame,

    /// 视频载荷不包含解码后的位图
    #[error("video media frame has no software bitmap")]
    MissingSoftwareBitmap,

    /// 无法为曝光时间获取感知时间戳
    #[error("perception timestamp resolution failed: {source}")]
    TimestampResolution {
        #[source]
        source: ContractError,
    },

    /// 协作方 (sink / resolver / 坐标系) panic
    #[error("collaborator panicked: {message}")]
    CollaboratorPanicked {
        /// panic 消息
        message: String,
    },
}

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrivalErrorKind {
    /// 预期情况，不算错误
    NotAvailable,
    /// 帧 / 视频载荷 / 位图缺失
    MissingData,
    /// 感知时间戳获取失败
    TimestampResolutionFailure,
    /// 协作方 panic
    Panicked,
}

impl ArrivalError {
    pub fn kind(&self) -> ArrivalErrorKind {
        match self {
            ArrivalError::FrameNotAvailable => ArrivalErrorKind::NotAvailable,
            ArrivalError::MissingVideoMediaFrame | ArrivalError::MissingSoftwareBitmap => {
                ArrivalErrorKind::MissingData
            }
            ArrivalError::TimestampResolution { .. } => {
                ArrivalErrorKind::TimestampResolutionFailure
            }
            ArrivalError::CollaboratorPanicked { .. } => ArrivalErrorKind::Panicked,
        }
    }
}

impl ArrivalErrorKind {
    /// 指标标签
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrivalErrorKind::NotAvailable => "not_available",
            ArrivalErrorKind::MissingData => "missing_data",
            ArrivalErrorKind::TimestampResolutionFailure => "timestamp_resolution",
            ArrivalErrorKind::Panicked => "panicked",
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, ArrivalError>;
