use serde::de::SeqAccess;
use serde::de::Visitor;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use crate::{Bitmap, Portable};

impl<'de> Deserialize<'de> for Bitmap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BitmapVisitor;

        impl<'de> Visitor<'de> for BitmapVisitor {
            type Value = Bitmap;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a portable roaring bitmap")
            }

            fn visit_bytes<E>(self, bytes: &[u8]) -> Result<Bitmap, E>
            where
                E: serde::de::Error,
            {
                Bitmap::deserialize::<Portable>(bytes).map_err(serde::de::Error::custom)
            }

            // Formats without a bytes type hand them over as a sequence
            fn visit_seq<A>(self, mut seq: A) -> Result<Bitmap, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut bytes: Vec<u8> = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(el) = seq.next_element()? {
                    bytes.push(el);
                }
                Bitmap::deserialize::<Portable>(&bytes).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_bytes(BitmapVisitor)
    }
}

impl Serialize for Bitmap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&Bitmap::serialize::<Portable>(self))
    }
}
