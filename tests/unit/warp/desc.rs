use kurbo::Affine;

use super::*;
use crate::band::contract::ColorInterp;
use crate::band::mem::MemBand;
use crate::dataset::block::BlockDataset;
use crate::dataset::handle::{Dataset, DatasetHandle};
use crate::foundation::buffer::RasterBufMut;
use crate::foundation::core::{BlockSize, RasterSize, Window};
use crate::foundation::data_type::DataType;
use crate::warp::warper::Warper;

fn registry_with_ramp() -> DatasetRegistry {
    let size = RasterSize::new(8, 8);
    let data = (0..64u8).collect();
    let band = MemBand::from_vec(size, BlockSize::new(4, 4).unwrap(), DataType::Byte, data)
        .unwrap()
        .with_color_interp(ColorInterp::Gray);
    let mut registry = DatasetRegistry::new();
    registry
        .register(DatasetHandle::new("ramp", BlockDataset::single(band).unwrap()))
        .unwrap();
    registry
}

fn halving_desc() -> WarpedDatasetDesc {
    WarpedDatasetDesc {
        source: "ramp".to_owned(),
        width: 4,
        height: 4,
        options: WarpOptions {
            block_width: 2,
            block_height: 2,
            working_type: None,
        },
        dst_to_src: Affine::scale(2.0),
    }
}

fn read_all(ds: &mut WarpedDataset) -> Vec<u8> {
    let mut out = vec![0u8; 16];
    let mut buf = RasterBufMut::new(&mut out, 4, 4, DataType::Byte).unwrap();
    ds.read_window(0, Window::new(0, 0, 4, 4), &mut buf).unwrap();
    out
}

#[test]
fn description_builds_and_round_trips() {
    let registry = registry_with_ramp();
    let desc = halving_desc();
    let mut ds = desc.build(&registry).unwrap();
    assert_eq!(ds.block_size(), BlockSize::new(2, 2).unwrap());
    assert_eq!(ds.band_info(0).unwrap().color_interp, ColorInterp::Gray);

    let pixels = read_all(&mut ds);
    for y in 0..4usize {
        for x in 0..4usize {
            assert_eq!(pixels[y * 4 + x] as usize, (2 * y + 1) * 8 + 2 * x + 1);
        }
    }

    assert_eq!(ds.to_desc().unwrap(), desc);
    let json = serde_json::to_string(&desc).unwrap();
    let parsed: WarpedDatasetDesc = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, desc);
    let mut rebuilt = WarpedDataset::from_desc(&parsed, &registry).unwrap();
    assert_eq!(read_all(&mut rebuilt), pixels);
}

#[test]
fn invalid_descriptions_are_config_errors() {
    let registry = registry_with_ramp();

    let mut unknown = halving_desc();
    unknown.source = "nope".to_owned();
    assert!(matches!(unknown.build(&registry), Err(RasterError::Config(_))));

    let mut empty = halving_desc();
    empty.height = 0;
    assert!(matches!(empty.build(&registry), Err(RasterError::Config(_))));

    let mut non_finite = halving_desc();
    non_finite.dst_to_src = Affine::new([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0]);
    assert!(matches!(non_finite.build(&registry), Err(RasterError::Config(_))));

    let mut zero_block = halving_desc();
    zero_block.options.block_width = 0;
    assert!(matches!(zero_block.build(&registry), Err(RasterError::Config(_))));
}

struct OpaqueWarper;

impl Warper for OpaqueWarper {
    fn warp_region(
        &mut self,
        _source: &mut dyn Dataset,
        _region: Window,
        _buf: &mut [u8],
        _band_count: usize,
        _working_type: DataType,
    ) -> RasterResult<()> {
        Ok(())
    }
}

#[test]
fn warps_without_an_affine_mapping_cannot_be_described() {
    let registry = registry_with_ramp();
    let ds = WarpedDataset::new(
        registry.resolve("ramp").unwrap(),
        RasterSize::new(4, 4),
        OpaqueWarper,
        WarpOptions::default(),
    )
    .unwrap();
    assert!(matches!(ds.to_desc(), Err(RasterError::Config(_))));
}
