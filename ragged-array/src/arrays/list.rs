use std::sync::Arc;

use log::debug;
use ragged_error::{RaggedExpect, RaggedResult, ragged_bail};
use ragged_form::{Form, FormInfo, ListForm, Parameters};

use crate::{ContentRef, Index, Item, ListOffsetArray};

/// Variable-length lists delimited by separate starts and stops, which may overlap, leave gaps
/// or appear out of order in the content.
#[derive(Debug, Clone)]
pub struct ListArray {
    starts: Index,
    stops: Index,
    content: ContentRef,
    parameters: Parameters,
}

impl ListArray {
    pub fn try_new(
        starts: Index,
        stops: Index,
        content: ContentRef,
        parameters: Parameters,
    ) -> RaggedResult<Self> {
        if !starts.index_type().is_list_index() || !stops.index_type().is_list_index() {
            ragged_bail!(
                ConstructionContract: "ListArray starts and stops must be one of \"i32\", \"u32\", \"i64\", not {:?} and {:?}",
                starts.index_type().name(),
                stops.index_type().name()
            );
        }
        if stops.len() < starts.len() {
            ragged_bail!(
                ConstructionContract: "ListArray has {} starts but only {} stops",
                starts.len(),
                stops.len()
            );
        }
        Ok(Self::new_unchecked(starts, stops, content, parameters))
    }

    pub(crate) fn new_unchecked(
        starts: Index,
        stops: Index,
        content: ContentRef,
        parameters: Parameters,
    ) -> Self {
        Self {
            starts,
            stops,
            content,
            parameters,
        }
    }

    pub fn starts(&self) -> &Index {
        &self.starts
    }

    pub fn stops(&self) -> &Index {
        &self.stops
    }

    pub fn content(&self) -> &ContentRef {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
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
        Form::List(
            ListForm::try_new(
                self.starts.index_type(),
                self.stops.index_type(),
                Arc::new(self.content.form()),
                FormInfo::with_parameters(self.parameters.clone()),
            )
            .ragged_expect("starts and stops types checked on construction"),
        )
    }

    /// The content range of list `i`, checked against the content.
    fn bounds(&self, i: usize) -> RaggedResult<(usize, usize)> {
        let (start, stop) = (self.starts.get(i), self.stops.get(i));
        if stop < start {
            ragged_bail!(IndexRange: "ListArray has stops[{}] = {} < starts[{}] = {}", i, stop, i, start);
        }
        if start < 0 || stop > self.content.len() as i64 {
            ragged_bail!(
                IndexRange: "ListArray list {} spans {}..{} but its content has length {}",
                i,
                start,
                stop,
                self.content.len()
            );
        }
        Ok((start as usize, stop as usize))
    }

    pub(crate) fn getitem_at_nowrap(&self, i: usize) -> RaggedResult<Item> {
        let (start, stop) = self.bounds(i)?;
        Ok(Item::from_list(
            &self.parameters,
            self.content.getitem_range_nowrap(start, stop),
        ))
    }

    pub(crate) fn getitem_range_nowrap(&self, start: usize, stop: usize) -> Self {
        Self {
            starts: self.starts.slice(start, stop),
            stops: self.stops.slice(start, stop),
            ..self.clone()
        }
    }

    pub(crate) fn carry_unchecked(&self, carry: &Index) -> RaggedResult<Self> {
        Ok(Self {
            starts: self.starts.take(carry)?,
            stops: self.stops.take(carry)?,
            ..self.clone()
        })
    }

    /// The lists gathered one after another into a contiguous content.
    pub fn to_list_offset64(&self) -> RaggedResult<ListOffsetArray> {
        let mut offsets = Vec::with_capacity(self.len() + 1);
        let mut nextcarry = Vec::new();
        offsets.push(0i64);
        for i in 0..self.len() {
            let (start, stop) = self.bounds(i)?;
            nextcarry.extend(start as i64..stop as i64);
            offsets.push(nextcarry.len() as i64);
        }
        debug!(
            "materialising {} lists of a ListArray into {} offset elements",
            self.len(),
            nextcarry.len()
        );
        let content = self.content.carry(&Index::from(nextcarry), false)?;
        Ok(ListOffsetArray::new_unchecked(
            Index::from(offsets),
            Arc::new(content),
            self.parameters.clone(),
        ))
    }
}

#[cfg(test)]
mod test {
    use ragged_error::ErrorKind;

    use super::*;
    use crate::{Content, NumpyArray};

    fn list(starts: Vec<i64>, stops: Vec<i64>) -> ListArray {
        let content = Arc::new(Content::Numpy(NumpyArray::from(vec![
            0.0f64, 1.1, 2.2, 3.3, 4.4, 5.5,
        ])));
        ListArray::try_new(Index::from(starts), Index::from(stops), content, Parameters::new())
            .unwrap()
    }

    #[test]
    fn compaction_follows_starts_and_stops() {
        let list = list(vec![4, 0, 2], vec![6, 0, 3]);
        let compact = list.to_list_offset64().unwrap();
        assert_eq!(compact.offsets(), &Index::from(vec![0i64, 2, 2, 3]));
        let Content::Numpy(values) = compact.content().as_ref() else {
            panic!("expected a leaf");
        };
        assert_eq!(values.data(), &crate::NumpyData::from(vec![4.4f64, 5.5, 2.2]));
    }

    #[test]
    fn reversed_bounds_are_rejected() {
        let list = list(vec![3], vec![1]);
        assert_eq!(
            list.to_list_offset64().unwrap_err().kind(),
            ErrorKind::IndexRange
        );
        assert_eq!(list.getitem_at_nowrap(0).unwrap_err().kind(), ErrorKind::IndexRange);
    }
}
