use pixelrts_api::sidecar::sidecar_path;
use pixelrts_api::{
    extract_segment, plan_segments, CompressionAlgorithm, Container, Decoder, Encoder,
    EncodingMode, FormatError, Metadata, PixelRtsError, UserMetadata,
};
use pixelrts_curve::{Coord, HilbertCurve};
use pixelrts_wasm::{minimal_module, sample_module};
use rstest::rstest;
use serde_json::Value;
use std::fs;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn pseudo_random(len: usize) -> Vec<u8> {
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state as u8
        })
        .collect()
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
#[case(4)]
#[case(5)]
#[case(4095)]
#[case(4096)]
#[case(65536)]
fn standard_png_round_trip(#[case] len: usize) {
    init_logging();
    let data = pseudo_random(len);
    let png = Encoder::new()
        .encode(&data, &UserMetadata::default())
        .unwrap()
        .to_png_bytes()
        .unwrap();
    assert_eq!(Decoder::new().decode_png(&png).unwrap(), data);
}

#[rstest]
#[case(false)]
#[case(true)]
fn compressed_png_round_trip(#[case] zeros: bool) {
    let data = if zeros { vec![0u8; 100_000] } else { pseudo_random(10_000) };
    let container = Encoder::builder()
        .compress(true)
        .build()
        .encode(&data, &UserMetadata::default())
        .unwrap();
    let png = container.to_png_bytes().unwrap();
    assert_eq!(Decoder::new().decode_png(&png).unwrap(), data);
}

#[test]
fn code_mode_png_round_trip() {
    init_logging();
    let module = minimal_module();
    let container = Encoder::builder()
        .mode(EncodingMode::Code)
        .build()
        .encode(&module, &UserMetadata::default().kind("wasm"))
        .unwrap();

    let origin = container.pixel(Coord { x: 0, y: 0 }).unwrap();
    assert_eq!((origin.g, origin.b), (module[0], module[1]));

    let png = container.to_png_bytes().unwrap();
    assert_eq!(Decoder::new().decode_png(&png).unwrap(), module);
}

#[test]
fn code_mode_survives_without_copy_after_png() {
    let module = sample_module();
    let png = Encoder::builder()
        .mode(EncodingMode::Code)
        .embed_verbatim_copy(false)
        .build()
        .encode(&module, &UserMetadata::default())
        .unwrap()
        .to_png_bytes()
        .unwrap();
    assert_eq!(Decoder::new().decode_png(&png).unwrap(), module);
}

#[test]
fn grid_size_is_minimal_power_of_two() {
    for len in [0usize, 1, 4, 5, 64, 65, 1000, 16384, 16385] {
        let container = Encoder::new()
            .encode(&vec![9u8; len], &UserMetadata::default())
            .unwrap();
        let grid = container.grid_size() as usize;
        assert!(grid.is_power_of_two());
        assert!(grid * grid * 4 >= len);
        if grid > 1 {
            let smaller = grid / 2;
            assert!(smaller * smaller * 4 < len, "len {len} fits a smaller grid");
        }
    }
}

#[test]
fn payload_follows_the_hilbert_curve() {
    let data: Vec<u8> = (0..64u8).collect();
    let container = Encoder::new().encode(&data, &UserMetadata::default()).unwrap();
    let curve = HilbertCurve::from_grid_size(container.grid_size()).unwrap();
    for (index, chunk) in data.chunks(4).enumerate() {
        let pixel = container.pixel(curve.index_to_coord(index).unwrap()).unwrap();
        assert_eq!(&pixel.to_bytes()[..], chunk);
    }
}

#[test]
fn save_load_with_sidecar() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("boot.rts.png");
    let data = pseudo_random(3000);
    Encoder::builder()
        .compress(true)
        .build()
        .encode(&data, &UserMetadata::default().name("boot").field("arch", "riscv64"))
        .unwrap()
        .save(&path, true)
        .unwrap();

    let sidecar: Value = serde_json::from_str(&fs::read_to_string(sidecar_path(&path)).unwrap()).unwrap();
    assert_eq!(sidecar["format"], "PixelRTS-2.0");
    assert_eq!(sidecar["arch"], "riscv64");

    let info = Decoder::info(&path).unwrap().unwrap();
    assert_eq!(info.user.name.as_deref(), Some("boot"));
    assert_eq!(info.data_size, 3000);
    assert_eq!(Decoder::new().load(&path).unwrap(), data);
}

#[test]
fn sidecar_fields_override_embedded_ones() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("module.rts.png");
    let module = minimal_module();
    Encoder::builder()
        .mode(EncodingMode::Code)
        .build()
        .encode(&module, &UserMetadata::default().description("embedded"))
        .unwrap()
        .save(&path, true)
        .unwrap();

    // Edit the sidecar: new description, stale verbatim copy.
    let sidecar = sidecar_path(&path);
    let mut json: Value = serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();
    json["description"] = "edited".into();
    json["original_data_b64"] = "AAAA".into();
    fs::write(&sidecar, serde_json::to_string(&json).unwrap()).unwrap();

    let container = Container::load(&path).unwrap();
    let metadata = container.metadata().unwrap();
    assert_eq!(metadata.user.description.as_deref(), Some("edited"));
    assert_eq!(Decoder::new().decode(&container).unwrap(), module);
}

#[test]
fn sidecar_alone_describes_a_bare_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bare.png");
    let data = pseudo_random(40);
    let container = Encoder::new().encode(&data, &UserMetadata::default()).unwrap();
    let metadata: Metadata = container.metadata().unwrap().clone();
    let (pixels, _) = container.into_parts();

    Container::new(metadata.grid_size, pixels, None)
        .unwrap()
        .save(&path, false)
        .unwrap();
    fs::write(sidecar_path(&path), metadata.to_json_pretty().unwrap()).unwrap();

    assert_eq!(Decoder::new().load(&path).unwrap(), data);
}

#[test]
fn capacity_error_reports_minimum_grid() {
    let result = Encoder::builder()
        .grid_size(4)
        .build()
        .encode(&[1u8; 65], &UserMetadata::default());
    match result {
        Err(PixelRtsError::Capacity {
            data_len,
            grid_size,
            minimum_grid_size,
        }) => {
            assert_eq!((data_len, grid_size, minimum_grid_size), (65, 4, 8));
        }
        other => panic!("expected capacity error, got {other:?}"),
    }
}

#[test]
fn corrupted_png_pixels_raise_integrity_error() {
    let data = pseudo_random(256);
    let container = Encoder::new().encode(&data, &UserMetadata::default()).unwrap();
    let (mut pixels, metadata) = container.into_parts();
    pixels[5].g = pixels[5].g.wrapping_add(1);
    let png = Container::new(8, pixels, metadata).unwrap().to_png_bytes().unwrap();

    assert!(matches!(
        Decoder::new().decode_png(&png),
        Err(PixelRtsError::Integrity { .. })
    ));
}

#[test]
fn non_png_input_is_a_format_error() {
    assert!(matches!(
        Decoder::new().decode_png(b"definitely not a png"),
        Err(PixelRtsError::Format(FormatError::Png(_)))
    ));
}

#[test]
fn segments_round_trip_and_plan() {
    init_logging();
    let kernel = pseudo_random(8192);
    let initrd = vec![0u8; 4096];
    let container = Encoder::builder()
        .compress(true)
        .build()
        .encode_segments(
            &[("vmlinuz", kernel.as_slice()), ("initrd.img", initrd.as_slice())],
            &UserMetadata::default(),
        )
        .unwrap();
    let metadata = container.metadata().unwrap().clone();
    assert_ne!(
        metadata.compression.as_ref().unwrap().algorithm,
        CompressionAlgorithm::None
    );

    let payload = Decoder::new()
        .decode_png(&container.to_png_bytes().unwrap())
        .unwrap();
    assert_eq!(extract_segment(&payload, &metadata, "vmlinuz").unwrap(), kernel);
    assert_eq!(extract_segment(&payload, &metadata, "initrd.img").unwrap(), initrd);

    let plan = plan_segments(&metadata, 2048).unwrap();
    assert_eq!(plan.files.len(), 2);
    assert!(plan.files.values().all(|entry| entry.is_complete()));
}
