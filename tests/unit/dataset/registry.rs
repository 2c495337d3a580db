use super::*;
use crate::band::mem::MemBand;
use crate::dataset::block::BlockDataset;
use crate::foundation::core::{BlockSize, RasterSize};
use crate::foundation::data_type::DataType;

fn handle(name: &str) -> DatasetHandle {
    let band = MemBand::new(
        RasterSize::new(2, 2),
        BlockSize::new(2, 2).unwrap(),
        DataType::Byte,
    )
    .unwrap();
    DatasetHandle::new(name, BlockDataset::single(band).unwrap())
}

#[test]
fn register_and_resolve() {
    let mut registry = DatasetRegistry::new();
    registry.register(handle("b")).unwrap();
    registry.register(handle("a")).unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);

    let a = registry.resolve("a").unwrap();
    assert_eq!(a.reference_count(), 2);
    assert!(a.same_dataset(registry.get("a").unwrap()));
}

#[test]
fn duplicate_and_unknown_names_are_config_errors() {
    let mut registry = DatasetRegistry::new();
    registry.register(handle("a")).unwrap();
    assert!(matches!(
        registry.register(handle("a")),
        Err(RasterError::Config(_))
    ));
    assert!(matches!(registry.resolve("zzz"), Err(RasterError::Config(_))));
}

#[test]
fn remove_hands_back_the_reference() {
    let mut registry = DatasetRegistry::new();
    registry.register(handle("a")).unwrap();
    let a = registry.remove("a").unwrap();
    assert!(registry.is_empty());
    assert_eq!(a.reference_count(), 1);
    assert!(registry.remove("a").is_none());
}
