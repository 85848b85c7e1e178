//! Integration tests for chunk planning and output geometry

use audiosr_pipeline::pipeline::planner::{chunk_samples_for, extract_padded, plan_chunks};
use audiosr_pipeline::Error;

#[test]
fn test_coverage_has_no_gaps() {
    for &len in &[1usize, 99, 100, 101, 250, 1000, 4097] {
        for &chunk in &[1usize, 7, 100, 512] {
            for &overlap in &[0.0, 0.04, 0.1, 0.5, 0.9] {
                let plan = plan_chunks(len, chunk, overlap).unwrap();

                let mut covered = vec![false; len];
                for c in &plan {
                    assert!(c.actual_length <= c.nominal_length);
                    assert_eq!(c.nominal_length, chunk);
                    for flag in &mut covered[c.start_offset..c.end_offset()] {
                        *flag = true;
                    }
                }
                assert!(
                    covered.iter().all(|&c| c),
                    "gap for len={} chunk={} overlap={}",
                    len,
                    chunk,
                    overlap
                );

                assert_eq!(plan.chunks[0].start_offset, 0);
                for pair in plan.chunks.windows(2) {
                    assert_eq!(pair[1].start_offset - pair[0].start_offset, plan.stride);
                    assert!(!pair[0].is_padded, "only the last chunk may be padded");
                }
            }
        }
    }
}

#[test]
fn test_stride_is_chunk_minus_overlap() {
    let plan = plan_chunks(100_000, 122880, 0.1).unwrap();
    assert_eq!(plan.overlap_samples, 12288);
    assert_eq!(plan.stride, 122880 - 12288);
}

#[test]
fn test_no_overlap_tiles_exactly_once() {
    let plan = plan_chunks(1000, 300, 0.0).unwrap();
    let total: usize = plan.iter().map(|c| c.actual_length).sum();
    assert_eq!(total, 1000);
    assert_eq!(plan.len(), 4);
    assert_eq!(plan.chunks[3].actual_length, 100);
}

#[test]
fn test_ten_second_scenario() {
    // 10 s at 24 kHz, 5.12 s chunks with 10% overlap
    let chunk = chunk_samples_for(5.12, 24000).unwrap();
    let plan = plan_chunks(240_000, chunk, 0.1).unwrap();

    assert_eq!(plan.len(), 3);
    assert_eq!(plan.stride, 110_592); // 4.608 s
    assert!(plan.chunks[2].is_padded);
    assert_eq!(plan.chunks[2].actual_length, 240_000 - 2 * 110_592);

    let geometry = plan.output_geometry(24000, 48000).unwrap();
    let last = &plan.chunks[2];
    let extent = geometry.placement(last) + geometry.keep_for(last);
    assert_eq!(extent, 480_000);
    assert_eq!(geometry.buffer_capacity(&plan), extent);
}

#[test]
fn test_chunk_longer_than_input() {
    let plan = plan_chunks(500, 1000, 0.0).unwrap();
    assert_eq!(plan.len(), 1);
    assert!(plan.chunks[0].is_padded);

    let geometry = plan.output_geometry(16000, 48000).unwrap();
    assert_eq!(geometry.keep_for(&plan.chunks[0]), 1500);
    assert_eq!(geometry.buffer_capacity(&plan), 1500);
}

#[test]
fn test_non_integer_ratio_geometry() {
    let plan = plan_chunks(44100 * 3, 44100, 0.0).unwrap();
    let geometry = plan.output_geometry(44100, 48000).unwrap();
    assert_eq!(geometry.chunk_length, 48000);
    assert_eq!(geometry.stride, 48000);
    assert_eq!(geometry.overlap, 0);
    assert_eq!(geometry.buffer_capacity(&plan), 144000);
}

#[test]
fn test_placement_tracks_input_position_over_long_channels() {
    // 10 minutes at 22.05 kHz, 10.24 s chunks with 4% overlap, to 48 kHz
    let chunk = chunk_samples_for(10.24, 22050).unwrap();
    let len = 600 * 22050;
    let plan = plan_chunks(len, chunk, 0.04).unwrap();
    let geometry = plan.output_geometry(22050, 48000).unwrap();
    assert_eq!(plan.len(), 61);

    for c in &plan {
        let ideal = (c.start_offset as f64 * 48000.0 / 22050.0).round() as usize;
        assert!(
            geometry.placement(c).abs_diff(ideal) <= 1,
            "chunk {} placed at {}, input position maps to {}",
            c.index,
            geometry.placement(c),
            ideal
        );
    }

    for c in plan.iter().skip(1) {
        let seams = geometry.seams(&plan, c.index);
        assert!(seams.head.abs_diff(geometry.overlap) <= 1, "chunk {} seam {}", c.index, seams.head);
        assert_eq!(seams.head, geometry.seams(&plan, c.index - 1).tail);
    }

    let ideal_len = (len as f64 * 48000.0 / 22050.0).round() as usize;
    assert!(geometry.buffer_capacity(&plan).abs_diff(ideal_len) <= 1);
}

#[test]
fn test_extract_padded_zero_fills() {
    let channel: Vec<f32> = (1..=10).map(|i| i as f32).collect();
    let plan = plan_chunks(channel.len(), 6, 0.5).unwrap();

    let windows: Vec<Vec<f32>> = plan.iter().map(|c| extract_padded(&channel, c)).collect();
    assert_eq!(windows.len(), 3);
    assert_eq!(windows[0], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(windows[1], vec![4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    assert_eq!(windows[2], vec![7.0, 8.0, 9.0, 10.0, 0.0, 0.0]);
}

#[test]
fn test_invalid_plans_rejected_before_dispatch() {
    assert!(matches!(plan_chunks(100, 0, 0.1), Err(Error::Planning(_))));
    assert!(matches!(plan_chunks(100, 10, 1.5), Err(Error::Planning(_))));
    assert!(matches!(plan_chunks(100, 10, f64::INFINITY), Err(Error::Planning(_))));
    assert!(matches!(chunk_samples_for(-1.0, 24000), Err(Error::Planning(_))));
}
