use loopseq_song::{NoteData, OutputHandle, Song, SongBuilder};

/// Part "A" (4s): drum plays "beat" (0.0, 2.0), bass plays "groove" (1.0).
/// Part "B" (2s): drum plays "fill" (0.5), bass is silent.
pub fn two_part_song() -> Song {
    SongBuilder::new(120.0)
        .instrument("drum", OutputHandle(1))
        .instrument("bass", OutputHandle(2))
        .sequence(
            "beat",
            "drum",
            [NoteData::new(0.0, "kick"), NoteData::new(2.0, "snare")],
        )
        .sequence("groove", "bass", [NoteData::new(1.0, "bass-e")])
        .sequence("fill", "drum", [NoteData::new(0.5, "tom")])
        .part("A", 4.0, [("drum", vec!["beat"]), ("bass", vec!["groove"])])
        .part("B", 2.0, [("drum", vec!["fill"])])
        .build()
        .expect("valid test song")
}

/// Part "A" (4s) with a single drum note at offset 0.
pub fn single_note_song() -> Song {
    SongBuilder::new(120.0)
        .instrument("drum", OutputHandle(1))
        .sequence("kick", "drum", [NoteData::new(0.0, "kick")])
        .part("A", 4.0, [("drum", vec!["kick"])])
        .build()
        .expect("valid test song")
}
