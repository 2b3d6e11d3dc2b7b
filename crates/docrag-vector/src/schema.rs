use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub const PATH_COLUMN: &str = "path";
pub const CONTENT_COLUMN: &str = "content";
pub const VECTOR_COLUMN: &str = "vector";
pub const DISTANCE_COLUMN: &str = "_distance";

pub const META_KEY: &str = "key";
pub const META_VALUE: &str = "value";

/// Rows of a collection: chunk text, source path and its embedding.
pub fn collection_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(PATH_COLUMN, DataType::Utf8, false),
        Field::new(CONTENT_COLUMN, DataType::Utf8, false),
        Field::new(
            VECTOR_COLUMN,
            DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim),
            true,
        ),
    ]))
}

/// Dimension of the vector column, if the schema has one.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
    match schema.field_with_name(VECTOR_COLUMN).ok()?.data_type() {
        DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
        _ => None,
    }
}

pub fn meta_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new(META_KEY, DataType::Utf8, false),
        Field::new(META_VALUE, DataType::Utf8, false),
        Field::new("updated_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
    ]))
}
