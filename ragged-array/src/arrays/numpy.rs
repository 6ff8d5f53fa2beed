use itertools::Itertools;
use ragged_buffer::Buffer;
use ragged_error::{RaggedResult, ragged_bail};
use ragged_form::{
    Form, FormInfo, NativePType, NumpyForm, PType, Parameters, match_each_native_ptype,
};

use crate::{Content, ContentRef, Index, Item, RegularArray, Scalar};

/// The typed values of a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum NumpyData {
    Bool(Buffer<bool>),
    I8(Buffer<i8>),
    I16(Buffer<i16>),
    I32(Buffer<i32>),
    I64(Buffer<i64>),
    U8(Buffer<u8>),
    U16(Buffer<u16>),
    U32(Buffer<u32>),
    U64(Buffer<u64>),
    F32(Buffer<f32>),
    F64(Buffer<f64>),
}

/// Apply `$body` to the buffer of a leaf, bound as `$values`.
#[macro_export]
macro_rules! match_each_numpy_data {
    ($self:expr, |$values:ident| $body:expr) => {{
        use $crate::NumpyData;
        match $self {
            NumpyData::Bool($values) => $body,
            NumpyData::I8($values) => $body,
            NumpyData::I16($values) => $body,
            NumpyData::I32($values) => $body,
            NumpyData::I64($values) => $body,
            NumpyData::U8($values) => $body,
            NumpyData::U16($values) => $body,
            NumpyData::U32($values) => $body,
            NumpyData::U64($values) => $body,
            NumpyData::F32($values) => $body,
            NumpyData::F64($values) => $body,
        }
    }};
}

macro_rules! numpy_data_from {
    ($T:ty, $variant:ident) => {
        impl From<Buffer<$T>> for NumpyData {
            fn from(values: Buffer<$T>) -> Self {
                NumpyData::$variant(values)
            }
        }

        impl From<Vec<$T>> for NumpyData {
            fn from(values: Vec<$T>) -> Self {
                NumpyData::$variant(Buffer::from(values))
            }
        }

        impl From<Vec<$T>> for NumpyArray {
            fn from(values: Vec<$T>) -> Self {
                NumpyArray::new(NumpyData::from(values))
            }
        }
    };
}

numpy_data_from!(bool, Bool);
numpy_data_from!(i8, I8);
numpy_data_from!(i16, I16);
numpy_data_from!(i32, I32);
numpy_data_from!(i64, I64);
numpy_data_from!(u8, U8);
numpy_data_from!(u16, U16);
numpy_data_from!(u32, U32);
numpy_data_from!(u64, U64);
numpy_data_from!(f32, F32);
numpy_data_from!(f64, F64);

/// Converts one native value into another native type.
///
/// Floats convert through `f64`, truncating towards zero when the target is an integer.
#[inline]
pub fn cast_native<S: NativePType, T: NativePType>(value: S) -> T {
    if T::PTYPE.is_float() || T::PTYPE == PType::Bool {
        T::from_f64(value.as_f64()).unwrap_or_default()
    } else if S::PTYPE.is_float() {
        T::from_f64(value.as_f64().trunc()).unwrap_or_default()
    } else if S::PTYPE.is_unsigned_int() {
        T::from_u64(value.as_u64())
    } else {
        T::from_i64(value.as_i64())
    }
}

impl NumpyData {
    pub fn ptype(&self) -> PType {
        match self {
            NumpyData::Bool(_) => PType::Bool,
            NumpyData::I8(_) => PType::I8,
            NumpyData::I16(_) => PType::I16,
            NumpyData::I32(_) => PType::I32,
            NumpyData::I64(_) => PType::I64,
            NumpyData::U8(_) => PType::U8,
            NumpyData::U16(_) => PType::U16,
            NumpyData::U32(_) => PType::U32,
            NumpyData::U64(_) => PType::U64,
            NumpyData::F32(_) => PType::F32,
            NumpyData::F64(_) => PType::F64,
        }
    }

    /// Values of the given type, none of them.
    pub fn empty(ptype: PType) -> Self {
        match_each_native_ptype!(ptype, |$T| NumpyData::from(Vec::<$T>::new()))
    }

    pub fn len(&self) -> usize {
        match_each_numpy_data!(self, |values| values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, i: usize) -> Scalar {
        match_each_numpy_data!(self, |values| Scalar::from(values[i]))
    }

    pub fn slice(&self, start: usize, stop: usize) -> Self {
        match_each_numpy_data!(self, |values| NumpyData::from(values.slice(start..stop)))
    }

    /// Gathers the values at `positions`, which must be in bounds.
    pub fn take(&self, positions: impl Iterator<Item = usize>) -> Self {
        match_each_numpy_data!(self, |values| {
            let values = values.as_slice();
            NumpyData::from(positions.map(|i| values[i]).collect_vec())
        })
    }

    /// The values converted to `ptype`.
    pub fn cast(&self, ptype: PType) -> Self {
        if self.ptype() == ptype {
            return self.clone();
        }
        match_each_numpy_data!(self, |values| {
            match_each_native_ptype!(ptype, |$T| {
                NumpyData::from(values.iter().map(|v| cast_native::<_, $T>(*v)).collect::<Vec<$T>>())
            })
        })
    }

    /// The values of all `parts`, each converted to `ptype`, one after another.
    pub fn concatenate<'a>(parts: impl IntoIterator<Item = &'a NumpyData>, ptype: PType) -> Self {
        match_each_native_ptype!(ptype, |$T| {
            let mut out: Vec<$T> = Vec::new();
            for part in parts {
                match_each_numpy_data!(part, |values| {
                    out.extend(values.iter().map(|v| cast_native::<_, $T>(*v)))
                });
            }
            NumpyData::from(out)
        })
    }
}

/// A leaf of primitive values, possibly with a fixed inner shape.
#[derive(Debug, Clone)]
pub struct NumpyArray {
    data: NumpyData,
    length: usize,
    inner_shape: Vec<usize>,
    parameters: Parameters,
}

impl NumpyArray {
    /// A one-dimensional leaf.
    pub fn new(data: NumpyData) -> Self {
        Self {
            length: data.len(),
            data,
            inner_shape: vec![],
            parameters: Parameters::new(),
        }
    }

    pub fn try_new(
        data: NumpyData,
        length: usize,
        inner_shape: Vec<usize>,
        parameters: Parameters,
    ) -> RaggedResult<Self> {
        let inner_size: usize = inner_shape.iter().product();
        if data.len() != length * inner_size {
            ragged_bail!(
                ConstructionContract: "NumpyArray of shape ({}, {:?}) needs {} values, got {}",
                length,
                inner_shape,
                length * inner_size,
                data.len()
            );
        }
        Ok(Self {
            data,
            length,
            inner_shape,
            parameters,
        })
    }

    pub fn data(&self) -> &NumpyData {
        &self.data
    }

    pub fn ptype(&self) -> PType {
        self.data.ptype()
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn inner_shape(&self) -> &[usize] {
        &self.inner_shape
    }

    fn inner_size(&self) -> usize {
        self.inner_shape.iter().product()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn with_parameters(&self, parameters: Parameters) -> Self {
        Self {
            parameters,
            ..self.clone()
        }
    }

    pub fn form(&self) -> Form {
        Form::Numpy(NumpyForm::new(
            self.ptype(),
            self.inner_shape.clone(),
            FormInfo::with_parameters(self.parameters.clone()),
        ))
    }

    /// The values as one dimension, dropping the inner shape.
    pub fn ravel(&self) -> NumpyArray {
        NumpyArray::new(self.data.clone())
    }

    /// The inner dimensions as nested regular lists.
    pub fn to_regular(&self) -> Content {
        match self.inner_shape.split_first() {
            None => Content::Numpy(self.clone()),
            Some((size, rest)) => {
                let inner = NumpyArray {
                    data: self.data.clone(),
                    length: self.length * size,
                    inner_shape: rest.to_vec(),
                    parameters: Parameters::new(),
                };
                Content::Regular(RegularArray::new_unchecked(
                    ContentRef::new(inner.to_regular()),
                    *size,
                    self.length,
                    self.parameters.clone(),
                ))
            }
        }
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> Item {
        if self.inner_shape.is_empty() {
            return Item::Scalar(self.data.get(i));
        }
        let inner_size = self.inner_size();
        let row = NumpyArray {
            data: self.data.slice(i * inner_size, (i + 1) * inner_size),
            length: self.inner_shape[0],
            inner_shape: self.inner_shape[1..].to_vec(),
            parameters: Parameters::new(),
        };
        Item::Array(ContentRef::new(Content::Numpy(row)))
    }

    pub(crate) fn getitem_range_nowrap(&self, start: usize, stop: usize) -> NumpyArray {
        let inner_size = self.inner_size();
        NumpyArray {
            data: self.data.slice(start * inner_size, stop * inner_size),
            length: stop - start,
            inner_shape: self.inner_shape.clone(),
            parameters: self.parameters.clone(),
        }
    }

    /// Gathers whole rows, `carry` having been checked against the length.
    pub(crate) fn carry_unchecked(&self, carry: &Index) -> NumpyArray {
        let inner_size = self.inner_size();
        let positions = carry
            .iter()
            .flat_map(|row| (row as usize * inner_size)..((row as usize + 1) * inner_size));
        NumpyArray {
            data: self.data.take(positions),
            length: carry.len(),
            inner_shape: self.inner_shape.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn casting_and_concatenation() {
        let ints = NumpyData::from(vec![1i32, -2, 3]);
        assert_eq!(ints.cast(PType::F64), NumpyData::from(vec![1.0f64, -2.0, 3.0]));
        assert_eq!(ints.cast(PType::Bool), NumpyData::from(vec![true, true, true]));
        let floats = NumpyData::from(vec![2.5f64]);
        assert_eq!(
            NumpyData::concatenate([&ints, &floats], PType::F64),
            NumpyData::from(vec![1.0f64, -2.0, 3.0, 2.5])
        );
        assert_eq!(cast_native::<u64, i64>(u64::MAX), -1);
    }

    #[test]
    fn inner_shape_rows() {
        let array = NumpyArray::try_new(
            NumpyData::from((0..12).collect_vec()),
            2,
            vec![3, 2],
            Parameters::new(),
        )
        .unwrap();
        assert_eq!(array.len(), 2);
        let sliced = array.getitem_range_nowrap(1, 2);
        assert_eq!(sliced.data(), &NumpyData::from((6..12).collect_vec()));
        let carried = array.carry_unchecked(&Index::from(vec![1i64, 0]));
        assert_eq!(carried.data().get(0), Scalar::I32(6));
        assert_eq!(
            array.to_regular().form(),
            Form::regular(3, Form::regular(2, Form::numpy(PType::I32)))
        );
        assert!(
            NumpyArray::try_new(NumpyData::from(vec![1u8]), 2, vec![], Parameters::new()).is_err()
        );
    }
}
