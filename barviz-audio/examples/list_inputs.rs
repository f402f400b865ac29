use std::time::Duration;

use barviz_audio::{
    fetcher::{input_device_names, SystemAudioFetcherDescriptor},
    AnalyserConfig, CaptureSource,
};

fn main() {
    let names = input_device_names().expect("list input devices");
    println!("Input devices:");
    for name in names.iter() {
        println!("  {}", name);
    }

    let device_name = std::env::args().nth(1);
    let desc = SystemAudioFetcherDescriptor {
        device_name,
        ..Default::default()
    };

    let mut source =
        CaptureSource::acquire(desc, AnalyserConfig::default()).expect("open input device");

    for _ in 0..40 {
        std::thread::sleep(Duration::from_millis(50));

        if let Some(frame) = source.tick() {
            let (bin, loudest) = frame
                .iter()
                .copied()
                .enumerate()
                .fold((0, f32::MIN), |max, (idx, value)| {
                    if value > max.1 {
                        (idx, value)
                    } else {
                        max
                    }
                });

            println!("Loudest bin: {:>3} ({:.1} dB)", bin, loudest);
        }
    }

    source.stop();
}
