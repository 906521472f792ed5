mod build;
mod date;
mod title;

pub use build::{
    Enclosure, Episode, build_episode, build_episode_with_duration, encode_segment, episode_url,
    folder_file_url, folder_name,
};
pub use date::parse_fuzzy;
pub use title::{DateSource, InferredTitle, infer, infer_publication_date, infer_title};
