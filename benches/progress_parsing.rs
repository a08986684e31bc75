//! Benchmarks for the hot parsing paths of a job
//!
//! ffmpeg progress lines are parsed once per status update, playlists once
//! per job but can carry thousands of segments.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hlsforged::manifest::parse_playlist;
use hlsforged_av::{parse_elapsed, ProgressTracker};
use url::Url;

const PROGRESS_LINE: &str =
    "frame= 1432 fps=287 q=-1.0 size=   12288kB time=00:00:57.28 bitrate=1757.4kbits/s speed=11.5x";

const NOISE_LINE: &str =
    "  Stream #0:1[0x101]: Audio: aac (LC) ([15][0][0][0] / 0x000F), 48000 Hz, stereo, fltp, 128 kb/s";

fn media_playlist(segments: usize) -> String {
    let mut playlist = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:6\n");
    for i in 0..segments {
        playlist.push_str(&format!("#EXTINF:6.006,\nsegment_{i:05}.ts\n"));
    }
    playlist.push_str("#EXT-X-ENDLIST\n");
    playlist
}

fn bench_progress_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("progress_lines");

    group.bench_function("parse_elapsed/progress", |b| {
        b.iter(|| parse_elapsed(black_box(PROGRESS_LINE)));
    });

    group.bench_function("parse_elapsed/noise", |b| {
        b.iter(|| parse_elapsed(black_box(NOISE_LINE)));
    });

    // A full remux worth of stderr: mostly progress, some stream info.
    let lines: Vec<String> = (0..600)
        .map(|s| {
            if s % 50 == 0 {
                NOISE_LINE.to_string()
            } else {
                format!(
                    "frame={} fps=300 q=-1.0 size=N/A time=00:{:02}:{:02}.00 bitrate=N/A speed=12x",
                    s * 25,
                    s / 60,
                    s % 60
                )
            }
        })
        .collect();

    group.throughput(Throughput::Elements(lines.len() as u64));
    group.bench_function("tracker/full_run", |b| {
        b.iter(|| {
            let mut tracker = ProgressTracker::new(600.0).unwrap();
            let mut reported = 0u32;
            for line in &lines {
                if tracker.observe(black_box(line)).is_some() {
                    reported += 1;
                }
            }
            reported
        });
    });

    group.finish();
}

fn bench_playlist_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("playlist_parsing");
    let base = Url::parse("https://cdn.example.com/live/stream/index.m3u8").unwrap();

    for segments in [10usize, 500, 5000] {
        let body = media_playlist(segments);
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(segments), &body, |b, body| {
            b.iter(|| parse_playlist(black_box(&base), black_box(body.as_bytes())).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_progress_lines, bench_playlist_parsing);
criterion_main!(benches);
