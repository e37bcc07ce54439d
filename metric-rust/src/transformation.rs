use kanon_framework::errors::*;

/// One generalization level per generalized attribute.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Transformation {
    levels: Vec<usize>,
}

impl Transformation {
    pub fn new(levels: Vec<usize>) -> Self {
        Transformation { levels }
    }

    /// The identity transformation over `dimensions` attributes.
    pub fn bottom(dimensions: usize) -> Self {
        Transformation { levels: vec![0; dimensions] }
    }

    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Sum of all levels.
    pub fn total(&self) -> usize {
        self.levels.iter().sum()
    }

    /// The transformation generalizing `dimension` one level further.
    pub fn successor(&self, dimension: usize) -> Transformation {
        let mut levels = self.levels.clone();
        levels[dimension] += 1;
        Transformation { levels }
    }

    /// Ensure this transformation is valid for hierarchies of the given heights.
    pub fn check(&self, heights: &[usize]) -> Result<()> {
        if self.levels.len() != heights.len() {
            return Err(format!("transformation has {} levels, but there are {} generalized attributes",
                               self.levels.len(), heights.len()).into());
        }
        match self.levels.iter().zip(heights).position(|(level, height)| level >= height) {
            Some(dimension) => Err(format!("level {} of dimension {} exceeds the hierarchy height {}",
                                           self.levels[dimension], dimension, heights[dimension]).into()),
            None => Ok(())
        }
    }
}

#[cfg(test)]
mod test_transformation {
    use crate::transformation::Transformation;

    #[test]
    fn levels() {
        let bottom = Transformation::bottom(2);
        assert_eq!(bottom.levels(), &[0, 0]);
        let next = bottom.successor(1);
        assert_eq!(next.levels(), &[0, 1]);
        assert_eq!(next.total(), 1);
        assert!(next.check(&[3, 2]).is_ok());
        assert!(next.successor(1).check(&[3, 2]).is_err());
        assert!(next.check(&[3]).is_err());
    }
}
