//! 按标签分组归约.

use ndarray::{ArrayView, Dimension};

use crate::data::row_major;
use crate::error::check_shape;
use crate::{Label, LabelResult};

/// 标签分桶. 以计数排序将所有行优先的扁平索引按标签值排列,
/// 同一标签的索引在排列中连续, 且保持原有的相对顺序.
///
/// 构建过程严格串行, 分桶结果与之后的归约是否并行无关.
#[derive(Clone, Debug)]
pub struct LabelBuckets {
    /// 按标签值排序后的扁平索引 (不含背景).
    order: Vec<usize>,

    /// `order[bounds[l - 1]..bounds[l]]` 为标签 `l` 的所有扁平索引.
    bounds: Vec<usize>,
}

impl LabelBuckets {
    /// 对标签数组分桶.
    pub fn new<D: Dimension>(labels: ArrayView<Label, D>) -> Self {
        let flat = row_major(&labels);
        let max = flat.iter().copied().max().unwrap_or(0) as usize;

        // 直方图 -> 前缀和
        let mut bounds = vec![0usize; max + 1];
        for &l in flat.iter().filter(|l| **l != 0) {
            bounds[l as usize] += 1;
        }
        for i in 1..bounds.len() {
            bounds[i] += bounds[i - 1];
        }

        let mut cursor = bounds.clone();
        cursor.rotate_right(1);
        cursor[0] = 0;
        let mut order = vec![0; bounds[max]];
        for (i, &l) in flat.iter().enumerate().filter(|(_, l)| **l != 0) {
            let c = &mut cursor[l as usize];
            order[*c] = i;
            *c += 1;
        }
        Self { order, bounds }
    }

    /// 最大标签值. 没有任何前景时为 `0`.
    #[inline]
    pub fn max_label(&self) -> Label {
        (self.bounds.len() - 1) as Label
    }

    /// 标签 `label` 的所有扁平索引 (行优先, 升序). 背景或超出范围的标签返回空切片.
    #[inline]
    pub fn bucket(&self, label: Label) -> &[usize] {
        let l = label as usize;
        if l == 0 || l >= self.bounds.len() {
            return &[];
        }
        &self.order[self.bounds[l - 1]..self.bounds[l]]
    }

    /// 标签 `label` 的元素个数.
    #[inline]
    pub fn count(&self, label: Label) -> usize {
        self.bucket(label).len()
    }

    /// 依次迭代标签 `1..=max_label()` 及其分桶, 包括空桶.
    pub fn iter(&self) -> impl Iterator<Item = (Label, &[usize])> + '_ {
        (1..=self.max_label()).map(move |l| (l, self.bucket(l)))
    }
}

/// 对每个标签的所有 `field` 元素调用 `func`.
///
/// # 返回值
///
/// 长度为 `max(labels)` 的向量, 第 `i` 个分量对应标签 `i + 1`.
/// 不存在的标签 (空桶) 不调用 `func`, 直接为 `None`.
/// `labels` 与 `field` 形状不一致时返回 [`LabelError::ShapeMismatch`](crate::LabelError::ShapeMismatch).
pub fn apply_func_to_labels<T, R, D, F>(
    labels: ArrayView<Label, D>,
    field: ArrayView<T, D>,
    mut func: F,
) -> LabelResult<Vec<Option<R>>>
where
    T: Clone,
    D: Dimension,
    F: FnMut(&[T]) -> R,
{
    check_shape(labels.shape(), field.shape())?;
    let buckets = LabelBuckets::new(labels);
    let values = row_major(&field);
    let mut buf = Vec::new();
    Ok(buckets
        .iter()
        .map(|(_, idx)| {
            if idx.is_empty() {
                return None;
            }
            buf.clear();
            buf.extend(idx.iter().map(|&i| values[i].clone()));
            Some(func(&buf))
        })
        .collect())
}

/// 带权重的 [`apply_func_to_labels`]. `func` 同时接收同一标签的数值与权重.
pub fn apply_weighted_func_to_labels<T, W, R, D, F>(
    labels: ArrayView<Label, D>,
    field: ArrayView<T, D>,
    weights: ArrayView<W, D>,
    mut func: F,
) -> LabelResult<Vec<Option<R>>>
where
    T: Clone,
    W: Clone,
    D: Dimension,
    F: FnMut(&[T], &[W]) -> R,
{
    check_shape(labels.shape(), field.shape())?;
    check_shape(labels.shape(), weights.shape())?;
    let buckets = LabelBuckets::new(labels);
    let values = row_major(&field);
    let weights = row_major(&weights);
    let (mut vb, mut wb) = (Vec::new(), Vec::new());
    Ok(buckets
        .iter()
        .map(|(_, idx)| {
            if idx.is_empty() {
                return None;
            }
            vb.clear();
            wb.clear();
            vb.extend(idx.iter().map(|&i| values[i].clone()));
            wb.extend(idx.iter().map(|&i| weights[i].clone()));
            Some(func(&vb, &wb))
        })
        .collect())
}

/// 对 `index` 中列出的每个标签调用 `func`, 不存在的标签取 `default`.
///
/// `index` 为 `None` 时依次处理 `1..=max(labels)`. 显式给出的标签 `0` 归约所有背景元素,
/// 没有背景元素时同样取 `default`.
pub fn labeled_comprehension<T, R, D, F>(
    field: ArrayView<T, D>,
    labels: ArrayView<Label, D>,
    index: Option<&[Label]>,
    mut func: F,
    default: R,
) -> LabelResult<Vec<R>>
where
    T: Clone,
    R: Clone,
    D: Dimension,
    F: FnMut(&[T]) -> R,
{
    labeled_comprehension_with_positions(field, labels, index, |v, _| func(v), default)
}

/// 与 [`labeled_comprehension`] 相同, 但 `func` 额外接收各元素的行优先扁平索引.
pub fn labeled_comprehension_with_positions<T, R, D, F>(
    field: ArrayView<T, D>,
    labels: ArrayView<Label, D>,
    index: Option<&[Label]>,
    mut func: F,
    default: R,
) -> LabelResult<Vec<R>>
where
    T: Clone,
    R: Clone,
    D: Dimension,
    F: FnMut(&[T], &[usize]) -> R,
{
    check_shape(labels.shape(), field.shape())?;
    let buckets = LabelBuckets::new(labels.clone());
    let values = row_major(&field);
    let all: Vec<Label>;
    let index = match index {
        Some(index) => index,
        None => {
            all = (1..=buckets.max_label()).collect();
            &all
        }
    };
    let background: Vec<usize> = if index.contains(&0) {
        let flat = row_major(&labels);
        (0..flat.len()).filter(|&i| flat[i] == 0).collect()
    } else {
        Vec::new()
    };
    let mut buf = Vec::new();
    Ok(index
        .iter()
        .map(|&l| {
            let idx = match l {
                0 => background.as_slice(),
                l => buckets.bucket(l),
            };
            if idx.is_empty() {
                return default.clone();
            }
            buf.clear();
            buf.extend(idx.iter().map(|&i| values[i].clone()));
            func(&buf, idx)
        })
        .collect())
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 借助 `rayon`, 并行地对每个标签调用 `func`. 结果与 [`apply_func_to_labels`] 完全一致.
///
/// 分桶仍然串行完成, 只有各桶的归约是并行的.
#[cfg(feature = "rayon")]
pub fn par_apply_func_to_labels<T, R, D, F>(
    labels: ArrayView<Label, D>,
    field: ArrayView<T, D>,
    func: F,
) -> LabelResult<Vec<Option<R>>>
where
    T: Clone + Sync,
    R: Send,
    D: Dimension,
    F: Fn(&[T]) -> R + Sync + Send,
{
    check_shape(labels.shape(), field.shape())?;
    let buckets = LabelBuckets::new(labels);
    let values = row_major(&field);
    let values: &[T] = &values;
    Ok((1..=buckets.max_label())
        .into_par_iter()
        .map(|l| {
            let idx = buckets.bucket(l);
            if idx.is_empty() {
                return None;
            }
            let v: Vec<T> = idx.iter().map(|&i| values[i].clone()).collect();
            Some(func(&v))
        })
        .collect())
}

/// 借助 `rayon`, 并行地运行 [`apply_weighted_func_to_labels`].
#[cfg(feature = "rayon")]
pub fn par_apply_weighted_func_to_labels<T, W, R, D, F>(
    labels: ArrayView<Label, D>,
    field: ArrayView<T, D>,
    weights: ArrayView<W, D>,
    func: F,
) -> LabelResult<Vec<Option<R>>>
where
    T: Clone + Sync,
    W: Clone + Sync,
    R: Send,
    D: Dimension,
    F: Fn(&[T], &[W]) -> R + Sync + Send,
{
    check_shape(labels.shape(), field.shape())?;
    check_shape(labels.shape(), weights.shape())?;
    let buckets = LabelBuckets::new(labels);
    let values = row_major(&field);
    let weights = row_major(&weights);
    let (values, weights): (&[T], &[W]) = (&values, &weights);
    Ok((1..=buckets.max_label())
        .into_par_iter()
        .map(|l| {
            let idx = buckets.bucket(l);
            if idx.is_empty() {
                return None;
            }
            let v: Vec<T> = idx.iter().map(|&i| values[i].clone()).collect();
            let w: Vec<W> = idx.iter().map(|&i| weights[i].clone()).collect();
            Some(func(&v, &w))
        })
        .collect())
}
