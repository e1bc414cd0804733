//! BaaS collection names.

pub const ROOMS: &str = "radio_rooms";
pub const TRACKS: &str = "radio_music_tracks";
pub const GENERATION_REQUESTS: &str = "radio_generate_requests";
pub const GENERATION_CALLBACKS: &str = "radio_generate_callbacks";
pub const REACTIONS: &str = "radio_user_track_reaction";
pub const PLAYLISTS: &str = "radio_playlists";
pub const PLAYLIST_ENTRIES: &str = "radio_playlist_track";
pub const USERS: &str = "users";
