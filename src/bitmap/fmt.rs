use std::fmt;

use crate::Bitmap;

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.min(), self.max()) {
            (Some(min), Some(max)) if self.len() >= 16 => {
                write!(f, "Bitmap<{:?} values between {:?} and {:?}>", self.len(), min, max)
            }
            _ => write!(f, "Bitmap<{:?}>", self.iter().collect::<Vec<u32>>()),
        }
    }
}
