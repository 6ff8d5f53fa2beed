use std::sync::Arc;

use arrow_buffer::bit_util;
use ragged_buffer::Buffer;
use ragged_error::{RaggedExpect, RaggedResult, ragged_bail};
use ragged_form::{BitMaskedForm, Form, FormInfo, IndexType, Parameters};

use crate::arrays::valid_carry;
use crate::mask::{get_bit, pack_bits, unpack_bits};
use crate::{Content, ContentRef, Index, IndexedOptionArray, Item};

/// Missing values marked by one bit per element, eight elements to a byte.
#[derive(Debug, Clone)]
pub struct BitMaskedArray {
    mask: Buffer<u8>,
    content: ContentRef,
    valid_when: bool,
    length: usize,
    lsb_order: bool,
    parameters: Parameters,
}

impl BitMaskedArray {
    pub fn try_new(
        mask: Buffer<u8>,
        content: ContentRef,
        valid_when: bool,
        length: usize,
        lsb_order: bool,
        parameters: Parameters,
    ) -> RaggedResult<Self> {
        if mask.len() < bit_util::ceil(length, 8) {
            ragged_bail!(
                ConstructionContract: "BitMaskedArray of length {} needs {} mask bytes, got {}",
                length,
                bit_util::ceil(length, 8),
                mask.len()
            );
        }
        if content.len() < length {
            ragged_bail!(
                ConstructionContract: "BitMaskedArray of length {} has a content of length {}",
                length,
                content.len()
            );
        }
        Ok(Self {
            mask,
            content,
            valid_when,
            length,
            lsb_order,
            parameters,
        })
    }

    /// Masks `content` with one flag per element, packed in `lsb_order`.
    pub fn from_validity(
        validity: &[bool],
        content: ContentRef,
        lsb_order: bool,
    ) -> RaggedResult<Self> {
        Self::try_new(
            pack_bits(validity, lsb_order),
            content,
            true,
            validity.len(),
            lsb_order,
            Parameters::new(),
        )
    }

    pub fn mask(&self) -> &Buffer<u8> {
        &self.mask
    }

    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    pub fn valid_when(&self) -> bool {
        self.valid_when
    }

    pub fn lsb_order(&self) -> bool {
        self.lsb_order
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
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
        Form::BitMasked(
            BitMaskedForm::try_new(
                IndexType::U8,
                Arc::new(self.content.form()),
                self.valid_when,
                self.lsb_order,
                FormInfo::with_parameters(self.parameters.clone()),
            )
            .ragged_expect("bit masks are u8"),
        )
    }

    /// Whether each element is present.
    pub fn validity(&self) -> Vec<bool> {
        unpack_bits(&self.mask, self.length, self.lsb_order)
            .into_iter()
            .map(|bit| bit == self.valid_when)
            .collect()
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> RaggedResult<Item> {
        if get_bit(&self.mask, i, self.lsb_order) == self.valid_when {
            self.content.getitem_at_nowrap(i)
        } else {
            Ok(Item::Missing)
        }
    }

    pub(crate) fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Self {
        let mask = if start % 8 == 0 {
            self.mask
                .slice(start / 8..bit_util::ceil(stop, 8).max(start / 8))
        } else {
            let bits = unpack_bits(&self.mask, stop, self.lsb_order);
            pack_bits(&bits[start..stop], self.lsb_order)
        };
        Self {
            mask,
            content: Arc::new(self.content.getitem_range_nowrap(start, stop)),
            length: stop - start,
            ..self.clone()
        }
    }

    pub(crate) fn carry_unchecked(&self, carry: &Index) -> RaggedResult<IndexedOptionArray> {
        Ok(IndexedOptionArray::new_unchecked(
            Index::from(self.option_index()).take(carry)?,
            self.content.clone(),
            self.parameters.clone(),
        ))
    }

    pub fn option_index(&self) -> Vec<i64> {
        self.validity()
            .into_iter()
            .enumerate()
            .map(|(i, valid)| if valid { i as i64 } else { -1 })
            .collect()
    }

    pub fn project(&self) -> RaggedResult<Content> {
        self.content
            .carry(&valid_carry(&self.option_index()), false)
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;
    use crate::NumpyArray;

    fn masked(lsb_order: bool) -> BitMaskedArray {
        let validity = [true, false, true, true, false, true, true, true, false, true];
        let content = Arc::new(Content::Numpy(NumpyArray::from((0..10i64).collect::<Vec<_>>())));
        BitMaskedArray::from_validity(&validity, content, lsb_order).unwrap()
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn ranges_keep_their_bits(#[case] lsb_order: bool) {
        let array = masked(lsb_order);
        let unaligned = array.getitem_range_nowrap(3, 9);
        assert_eq!(
            unaligned.validity(),
            vec![true, false, true, true, true, false]
        );
        let aligned = array.getitem_range_nowrap(8, 10);
        assert_eq!(aligned.validity(), vec![false, true]);
        assert!(aligned.mask().len() == 1);
    }

    #[test]
    fn carry_becomes_an_indexed_option() {
        let carried = masked(true)
            .carry_unchecked(&Index::from(vec![1i64, 0, 9]))
            .unwrap();
        assert_eq!(carried.index(), &Index::from(vec![-1i64, 0, 9]));
    }
}
