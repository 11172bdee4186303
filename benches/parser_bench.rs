//! Benchmarks for the REB record parser.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use reb_parser::{Dialect, Region, StationCatalog, detect_dialect, parse_report};
use std::io::Cursor;

/// One new-layout record accepted by the benchmark region and catalog.
const NEW_RECORD: &str = "EVENT 15761185 NORTHERN MID-ATLANTIC RIDGE
   Date       Time        Err   RMS Latitude Longitude  Smaj  Smin  Az Depth   Err Ndef Nsta Gap  mdist  Mdist Qual   Author      OrigID
2018/05/03 04:12:41.81   0.74  0.68  31.8863  -40.6214  14.1  10.8  58   0.0f        14   10  92  27.36  96.36 m i ke IDC_REB    15761185

Magnitude  Err Nsta Author      OrigID
mb     4.2 0.1    8 IDC_REB    15761185

Sta     Dist  EvAz Phase        Time      TRes  Azim AzRes   Slow   SRes Def   SNR       Amp   Per Qual Magnitude    ArrID
ASCN   27.36 146.1 P       04:18:25.350   0.4  327.3  -2.1    8.6    0.4 TAS  11.2      3.1  0.90 a__  mb   4.1  123456701
NVAR   45.12  52.3 P       04:20:31.040  -0.3  231.2   1.7    7.9   -0.2 TAS   9.8      2.4  1.05 a__  mb   4.3  123456702
ARCES  48.77  18.9 P       04:20:58.510   0.1  254.6   0.9    7.7    0.3 TAS  14.0      1.8  0.85 a__  mb   4.2  123456703



";

/// One new-layout record rejected at its origin line.
const OUTSIDE_RECORD: &str = "EVENT 15761190 KURIL ISLANDS
   Date       Time        Err   RMS Latitude Longitude  Smaj  Smin  Az Depth   Err Ndef Nsta Gap  mdist  Mdist Qual   Author      OrigID
2018/05/03 06:01:12.44   1.02  0.81  46.1021  151.8830  18.4  12.2  71  35.0         9    8 120  12.20  88.10 m i ke IDC_REB    15761190

Sta     Dist  EvAz Phase        Time      TRes  Azim AzRes   Slow   SRes Def   SNR       Amp   Per Qual Magnitude    ArrID
NVAR   62.31  48.2 P       06:11:02.100   0.2  305.1   1.1    6.4    0.1 TAS   7.2      1.1  0.95 a__  mb   4.0  123456801



";

fn bulletin(records: usize) -> String {
    let mut text = String::from("DATA_TYPE BULLETIN IMS1.0:short\nReviewed Event Bulletin\n\n");
    for i in 0..records {
        text.push_str(if i % 2 == 0 { NEW_RECORD } else { OUTSIDE_RECORD });
    }
    text.push_str("STOP\n");
    text
}

fn region() -> Region {
    Region::Box {
        lat_max: 36.0,
        lat_min: 25.0,
        long_min: -46.0,
        long_max: -35.0,
    }
}

fn bench_parse_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_report");
    let region = region();
    let catalog: StationCatalog = ["NVAR", "ARCES"].into_iter().collect();

    // Single record
    let single = bulletin(1);
    group.throughput(Throughput::Elements(1));
    group.bench_function("single", |b| {
        b.iter(|| parse_report(Cursor::new(black_box(single.as_str())), Dialect::New, &region, &catalog))
    });

    // Batch of records, half of them outside the region
    let batch = bulletin(200);
    group.throughput(Throughput::Elements(200));
    group.bench_function("batch", |b| {
        b.iter(|| parse_report(Cursor::new(black_box(batch.as_str())), Dialect::New, &region, &catalog))
    });

    group.finish();
}

fn bench_detect_dialect(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_dialect");
    let text = bulletin(200);

    group.bench_function("first_header", |b| {
        b.iter(|| detect_dialect(Cursor::new(black_box(text.as_str()))))
    });

    group.finish();
}

criterion_group!(benches, bench_parse_report, bench_detect_dialect);
criterion_main!(benches);
