use loopseq_song::{NoteData, OutputHandle, Song, SongBuilder, SongError};

const KICK: OutputHandle = OutputHandle(0);
const HATS: OutputHandle = OutputHandle(1);
const BASS: OutputHandle = OutputHandle(2);

/// A small two-part groove at 120 bpm: a one-bar intro and a two-bar verse.
pub fn demo_song() -> Result<Song, SongError> {
    let eighths = (0..8).map(|i| {
        let volume = if i % 2 == 0 { 0.8 } else { 0.5 };
        NoteData::new(i as f64 * 0.25, "hat").with_volume(volume)
    });

    SongBuilder::new(120.0)
        .instrument("kick", KICK)
        .instrument("hats", HATS)
        .instrument("bass", BASS)
        .sequence(
            "four-on-the-floor",
            "kick",
            (0..4).map(|beat| NoteData::new(beat as f64 * 0.5, "kick")),
        )
        .sequence("eighths", "hats", eighths)
        .sequence(
            "walk",
            "bass",
            [
                NoteData::new(0.0, "bass-e"),
                NoteData::new(1.0, "bass-g"),
                NoteData::new(2.0, "bass-a"),
                NoteData::new(3.0, "bass-b").with_volume(0.7),
            ],
        )
        .part("intro", 2.0, [("kick", vec!["four-on-the-floor"])])
        .part(
            "verse",
            4.0,
            [
                ("kick", vec!["four-on-the-floor"]),
                ("hats", vec!["eighths"]),
                ("bass", vec!["walk"]),
            ],
        )
        .build()
}
