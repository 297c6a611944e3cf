//! File codecs, loaders and output naming.

pub mod athena;
pub mod load;
pub mod naming;
pub mod ssrl;
mod text;
pub mod traits;
pub mod yaml;

pub use athena::AthenaWriter;
pub use load::{InputFormat, load, load_combined, load_many, load_one, read_raw};
pub use naming::{next_available_path, render_name};
pub use ssrl::SsrlCodec;
pub use traits::{
    RawSpectrum, SpectrumFileReader, SpectrumFileWriter, SpectrumReader, SpectrumWriter,
};
pub use yaml::YamlCodec;
