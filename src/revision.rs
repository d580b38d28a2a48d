use uuid::Uuid;

/// 以 revision id 識別內容版本的物件。
///
/// 每次會影響衍生值的修改都會發新的 id，因此以 id 為 key 的 cache
/// 在 id 不同時即失效。內容相同的兩個物件仍持有不同的 id。
pub trait Revisioned {
    fn revision(&self) -> Uuid;
}
