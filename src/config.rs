//! Manages configuration from commandline and settings file.

use serde::Deserialize;

// For std::fs::File.read_to_string()
use std::io::prelude::*;

use crate::err;

/// How to launch the program.
#[derive(Debug)]
pub enum Mode {
    /// Show version and quit.
    Version,

    /// Decode images from commandline.
    Decode(Settings),
}

/// Which Hilbert transform implementation to demodulate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hilbert {
    /// FFT over the whole recording.
    Fft,
    /// FIR transformer with matched group delay.
    Fir,
}

/// Holds every setting available.
#[derive(Debug)]
pub struct Settings {
    /// Input filename.
    pub input_filename: String,

    /// Output filename.
    pub output_filename: String,

    /// If we are exporting steps to WAV.
    pub wav_steps: bool,

    /// Input is headerless 16 bit little-endian PCM instead of WAV.
    pub raw_input: bool,

    /// Sample rate of the raw input in Hz.
    pub raw_rate: u32,

    /// Hilbert transform implementation to use.
    pub hilbert: Hilbert,

    /// Attenuation in dB for the FIR Hilbert transformer.
    pub fir_atten: f32,

    /// Transition band width in Hz for the FIR Hilbert transformer.
    pub fir_delta_freq: f32,
}

/// Holds the deserialized raw parsed settings file.
#[derive(Deserialize)]
struct DeSettings {
    profiles: DeProfiles,
}

/// Holds the deserialized raw parsed profiles table.
#[derive(Deserialize)]
struct DeProfiles {
    default_profile: String,
    batch: DeProfile,
    streaming: DeProfile,
}

/// Holds each deserialized raw parsed profile subtable.
#[derive(Deserialize)]
struct DeProfile {
    hilbert: String,
    fir_atten: f64,
    fir_delta_freq: f64,
}

/// Parse `DeSettings` from file.
fn parse_from_file(filename: &std::path::PathBuf) -> err::Result<DeSettings> {
    let mut file = std::fs::File::open(filename)?;

    let mut text = String::new();
    file.read_to_string(&mut text)?;

    Ok(toml::from_str(text.as_str())?)
}

/// Load `DeSettings` from settings file.
///
/// Tries to create the settings file if it's not available and loads the
/// default settings.
fn load_de_settings() -> DeSettings {

    let default_settings_str = include_str!("default_settings.toml");

    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "sstv-decode") {

        let filename = proj_dirs.config_dir().join("settings.toml");

        if let Ok(de_settings) = parse_from_file(&filename) {

            return de_settings;

        } else {

            let _result = std::fs::create_dir_all(proj_dirs.config_dir());

            if let Ok(mut file) = std::fs::File::create(&filename) {
                println!("Created default settings file on {:?}", &filename);
                file.write_all(default_settings_str.as_bytes())
                    .expect("Could not write to file");
            } else {
                println!(
                    "Could not open or create settings file ({:?}), using default settings",
                    &filename,
                );
            }
            return toml::from_str(default_settings_str).expect(
                "Failed to parse default settings"
            );
        }
    } else {
        println!("Could not get system settings directory, using default settings");
        return toml::from_str(default_settings_str).expect(
            "Failed to parse default settings"
        );
    }
}

/// Get configuration from commandline and settings file.
///
/// Returns the verbosity and the mode including the settings.
pub fn get_config() -> (log::Level, Mode) {

    // Parse commandline

    let mut input_filename: Option<String> = None;
    let mut print_version = false;
    let mut debug = false;
    let mut quiet = false;
    let mut wav_steps = false;
    let mut raw_input = false;
    let mut raw_rate: Option<u32> = None;
    let mut profile: Option<String> = None;
    let mut output_filename: Option<String> = None;
    {
        let mut parser = argparse::ArgumentParser::new();
        parser.set_description("Decode SSTV images from WAV or raw PCM \
                               recordings.");
        parser.refer(&mut input_filename)
            .add_argument("input_filename", argparse::StoreOption,
            "Input recording, WAV by default.");
        parser.refer(&mut print_version)
            .add_option(&["-v", "--version"], argparse::StoreTrue,
            "Show version and quit.");
        parser.refer(&mut debug)
            .add_option(&["-d", "--debug"], argparse::StoreTrue,
            "Print debugging messages.");
        parser.refer(&mut quiet)
            .add_option(&["-q", "--quiet"], argparse::StoreTrue,
            "Don't print info messages.");
        parser.refer(&mut wav_steps)
            .add_option(&["--wav-steps"], argparse::StoreTrue,
            "Export a WAV for every step of the demodulation process for \
            debugging, the files will be located on the current folder, named \
            {number}_{description}.wav");
        parser.refer(&mut raw_input)
            .add_option(&["--raw"], argparse::StoreTrue,
            "Input is headerless signed 16 bit little-endian PCM instead of \
            WAV, see also --rate.");
        parser.refer(&mut raw_rate)
            .add_option(&["-r", "--rate"], argparse::StoreOption,
            "Sample rate of a raw input in Hz, 15000 by default. Ignored for \
            WAV inputs, those carry their rate.")
            .metavar("SAMPLE_RATE");
        parser.refer(&mut profile)
            .add_option(&["-p", "--profile"], argparse::StoreOption,
            "Demodulator profile to use, values loaded from settings file. \
            Possible values: \"batch\" or \"streaming\".");
        parser.refer(&mut output_filename)
            .add_option(&["-o", "--output"], argparse::StoreOption,
            "Set output path, './output.png' by default. Recordings with \
            several images get a number appended to the name.")
            .metavar("FILENAME");
        parser.parse_args_or_exit();
    }

    // Open settings file
    let de_settings = load_de_settings();

    // Decide and merge commandline arguments and settings

    let profile: String = profile.unwrap_or(de_settings.profiles.default_profile);
    let profile: DeProfile = match profile.as_str() {
        "batch" => de_settings.profiles.batch,
        "streaming" => de_settings.profiles.streaming,
        string => {
            println!("Invalid profile \"{}\", using batch profile", string);
            de_settings.profiles.batch
        },
    };

    let hilbert = match profile.hilbert.as_str() {
        "fft" => Hilbert::Fft,
        "fir" => Hilbert::Fir,
        string => {
            println!("Invalid hilbert implementation \"{}\", using fft", string);
            Hilbert::Fft
        },
    };

    let verbosity = if debug {
        log::Level::Debug
    } else if quiet {
        log::Level::Warn
    } else {
        log::Level::Info
    };

    if print_version {
        return (verbosity, Mode::Version);
    }

    let input_filename = match input_filename {
        Some(input_filename) => input_filename,
        None => {
            println!("No input file given, see --help");
            std::process::exit(0);
        },
    };

    let settings = Settings {
        input_filename,
        output_filename: output_filename.unwrap_or("./output.png".to_string()),
        wav_steps,
        raw_input,
        raw_rate: raw_rate.unwrap_or(crate::sstv::NOMINAL_RATE),
        hilbert,
        fir_atten: profile.fir_atten as f32,
        fir_delta_freq: profile.fir_delta_freq as f32,
    };

    (verbosity, Mode::Decode(settings))
}
