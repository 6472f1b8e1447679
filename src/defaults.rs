//! Default configuration constants for maus-align.
//!
//! Shared between the config types and the aligner so that defaults live in
//! one place.

/// Default MAUS language code.
///
/// "aus" selects the Australian English acoustic models.
pub const LANGUAGE: &str = "aus";

/// Default output format requested from MAUS.
pub const OUTFORMAT: &str = "TextGrid";

/// Default minimum pause length, in frames.
pub const MINPAUSLEN: u32 = 5;

/// Default first word of the BPF to align.
pub const STARTWORD: u32 = 0;

/// Default last word of the BPF to align. MAUS clamps this to the word count.
pub const ENDWORD: u32 = 999_999;

/// Default segment boundary shift, in milliseconds.
pub const MAUSSHIFT: f64 = 10.0;

/// Default insertion probability for optional inter-word silence.
pub const INSPROB: f64 = 0.0;

/// Default for restricting alignment to the canonical pronunciation.
pub const CANONLY: bool = false;

/// Default for honouring a TRN chunk segmentation in the BPF.
pub const USETRN: bool = false;

/// Default for adding the KAN tier to TextGrid output.
pub const INSKANTEXTGRID: bool = true;

/// Default for adding the ORT tier to TextGrid output.
pub const INSORTTEXTGRID: bool = true;

/// Default local MAUS executable.
pub const MAUS_PATH: &str = "maus";

/// Default container runtime binary.
pub const DOCKER: &str = "docker";

/// Default MAUS container image.
pub const DOCKER_IMAGE: &str = "stevecassidy/maus";

/// Path of the MAUS executable inside the container image.
pub const CONTAINER_MAUS_PATH: &str = "/home/maus/maus";

/// Application directory name under the XDG config directory.
pub const APP_NAME: &str = "maus-align";

/// Suffix for audio written to disk for batch processing.
pub const AUDIO_SUFFIX: &str = ".wav";

/// Suffix for the temporary BPF input artifact.
pub const BPF_SUFFIX: &str = ".par";

/// Prefix for every temporary artifact, so stray files are recognisable.
pub const TEMP_PREFIX: &str = "maus-";
