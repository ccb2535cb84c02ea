//! 运行时错误.

use std::fmt::{Display, Formatter};

/// 标签引擎的输入错误. 所有检查都在实际计算开始之前完成.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// 标签数组与数值/权重/掩膜数组的形状不一致.
    ShapeMismatch {
        /// 期望的形状 (通常是标签数组的形状).
        expected: Vec<usize>,

        /// 实际传入的形状.
        found: Vec<usize>,
    },

    /// 参数不合法, 例如多掩膜过滤时掩膜集合为空.
    InvalidArgument(&'static str),
}

impl Display for LabelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelError::ShapeMismatch { expected, found } => {
                write!(f, "shape mismatch: expected {expected:?}, found {found:?}")
            }
            LabelError::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
        }
    }
}

impl std::error::Error for LabelError {}

/// 标签引擎运行时错误.
pub type LabelResult<T> = Result<T, LabelError>;

/// 检查两个形状是否完全一致.
#[inline]
pub(crate) fn check_shape(expected: &[usize], found: &[usize]) -> LabelResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(LabelError::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        })
    }
}
