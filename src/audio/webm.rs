//! Minimal WebM writer for a single Opus audio track.
//!
//! Produces an EBML header, one Segment with Info and Tracks, and Clusters of
//! SimpleBlocks. Every element size is known up front because the whole
//! recording is muxed in memory.

const EBML: u32 = 0x1A45_DFA3;
const EBML_VERSION: u32 = 0x4286;
const EBML_READ_VERSION: u32 = 0x42F7;
const EBML_MAX_ID_LENGTH: u32 = 0x42F2;
const EBML_MAX_SIZE_LENGTH: u32 = 0x42F3;
const DOC_TYPE: u32 = 0x4282;
const DOC_TYPE_VERSION: u32 = 0x4287;
const DOC_TYPE_READ_VERSION: u32 = 0x4285;

const SEGMENT: u32 = 0x1853_8067;
const INFO: u32 = 0x1549_A966;
const TIMECODE_SCALE: u32 = 0x2A_D7B1;
const MUXING_APP: u32 = 0x4D80;
const WRITING_APP: u32 = 0x5741;
const DURATION: u32 = 0x4489;

const TRACKS: u32 = 0x1654_AE6B;
const TRACK_ENTRY: u32 = 0xAE;
const TRACK_NUMBER: u32 = 0xD7;
const TRACK_UID: u32 = 0x73C5;
const TRACK_TYPE: u32 = 0x83;
const CODEC_ID: u32 = 0x86;
const CODEC_PRIVATE: u32 = 0x63A2;
const CODEC_DELAY: u32 = 0x56AA;
const SEEK_PRE_ROLL: u32 = 0x56BB;
const AUDIO: u32 = 0xE1;
const SAMPLING_FREQUENCY: u32 = 0xB5;
const CHANNELS: u32 = 0x9F;

const CLUSTER: u32 = 0x1F43_B675;
const TIMECODE: u32 = 0xE7;
const SIMPLE_BLOCK: u32 = 0xA3;

const TRACK_TYPE_AUDIO: u64 = 2;
const AUDIO_TRACK: u64 = 1;
/// Timestamps are in milliseconds
const NANOS_PER_TICK: u64 = 1_000_000;
/// Opus always decodes at 48 kHz
const OPUS_OUTPUT_RATE: u32 = 48_000;
const OPUS_SEEK_PRE_ROLL_NS: u64 = 80_000_000;
/// Block timecodes are i16 offsets from their cluster
const CLUSTER_SPAN_MS: u64 = 5_000;

const APP_NAME: &[u8] = b"envisonet";

/// Parameters of the Opus stream carried in the track
#[derive(Debug, Clone, Copy)]
pub struct OpusTrack {
    pub channels: u8,
    pub input_sample_rate: u32,
    /// Decoder samples to discard at 48 kHz
    pub pre_skip: u16,
}

/// Mux Opus packets of `frame_ms` each into a complete WebM file.
pub fn mux_opus(track: &OpusTrack, packets: &[Vec<u8>], frame_ms: u64) -> Vec<u8> {
    let frame_ms = frame_ms.clamp(1, CLUSTER_SPAN_MS);
    let duration_ms = packets.len() as u64 * frame_ms;

    let header = master(
        EBML,
        &[
            uint_element(EBML_VERSION, 1),
            uint_element(EBML_READ_VERSION, 1),
            uint_element(EBML_MAX_ID_LENGTH, 4),
            uint_element(EBML_MAX_SIZE_LENGTH, 8),
            element(DOC_TYPE, b"webm"),
            uint_element(DOC_TYPE_VERSION, 4),
            uint_element(DOC_TYPE_READ_VERSION, 2),
        ],
    );

    let info = master(
        INFO,
        &[
            uint_element(TIMECODE_SCALE, NANOS_PER_TICK),
            element(MUXING_APP, APP_NAME),
            element(WRITING_APP, APP_NAME),
            float_element(DURATION, duration_ms as f64),
        ],
    );

    let codec_delay_ns =
        u64::from(track.pre_skip) * 1_000_000_000 / u64::from(OPUS_OUTPUT_RATE);
    let tracks = master(
        TRACKS,
        &[master(
            TRACK_ENTRY,
            &[
                uint_element(TRACK_NUMBER, AUDIO_TRACK),
                uint_element(TRACK_UID, AUDIO_TRACK),
                uint_element(TRACK_TYPE, TRACK_TYPE_AUDIO),
                element(CODEC_ID, b"A_OPUS"),
                element(CODEC_PRIVATE, &opus_head(track)),
                uint_element(CODEC_DELAY, codec_delay_ns),
                uint_element(SEEK_PRE_ROLL, OPUS_SEEK_PRE_ROLL_NS),
                master(
                    AUDIO,
                    &[
                        float_element(SAMPLING_FREQUENCY, f64::from(OPUS_OUTPUT_RATE)),
                        uint_element(CHANNELS, u64::from(track.channels)),
                    ],
                ),
            ],
        )],
    );

    let frames_per_cluster = (CLUSTER_SPAN_MS / frame_ms) as usize;
    let mut segment = Vec::with_capacity(
        info.len() + tracks.len() + packets.iter().map(|p| p.len() + 8).sum::<usize>(),
    );
    segment.extend_from_slice(&info);
    segment.extend_from_slice(&tracks);

    for (index, group) in packets.chunks(frames_per_cluster).enumerate() {
        let cluster_start = (index * frames_per_cluster) as u64 * frame_ms;
        let mut children = vec![uint_element(TIMECODE, cluster_start)];
        for (offset, packet) in group.iter().enumerate() {
            children.push(simple_block((offset as u64 * frame_ms) as i16, packet));
        }
        segment.extend_from_slice(&master(CLUSTER, &children));
    }

    let mut out = header;
    out.extend_from_slice(&element(SEGMENT, &segment));
    out
}

/// Identification header from RFC 7845, mapping family 0
fn opus_head(track: &OpusTrack) -> Vec<u8> {
    let mut head = b"OpusHead".to_vec();
    head.push(1);
    head.push(track.channels);
    head.extend_from_slice(&track.pre_skip.to_le_bytes());
    head.extend_from_slice(&track.input_sample_rate.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes());
    head.push(0);
    head
}

fn simple_block(relative_ms: i16, packet: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(packet.len() + 4);
    // Track number as a one-byte vint
    payload.push(0x80 | AUDIO_TRACK as u8);
    payload.extend_from_slice(&relative_ms.to_be_bytes());
    // Keyframe
    payload.push(0x80);
    payload.extend_from_slice(packet);
    element(SIMPLE_BLOCK, &payload)
}

fn master(id: u32, children: &[Vec<u8>]) -> Vec<u8> {
    element(id, &children.concat())
}

fn uint_element(id: u32, value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count().min(7);
    element(id, &bytes[skip..])
}

fn float_element(id: u32, value: f64) -> Vec<u8> {
    element(id, &value.to_be_bytes())
}

fn element(id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 12);
    write_id(&mut out, id);
    write_size(&mut out, payload.len() as u64);
    out.extend_from_slice(payload);
    out
}

fn write_id(out: &mut Vec<u8>, id: u32) {
    let bytes = id.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.extend_from_slice(&bytes[skip..]);
}

/// Shortest EBML vint for `size`; the all-ones value is reserved for "unknown"
fn write_size(out: &mut Vec<u8>, size: u64) {
    let len = (1..8usize).find(|&n| size < (1u64 << (7 * n)) - 1).unwrap_or(8);
    let marked = size | (1u64 << (7 * len));
    out.extend_from_slice(&marked.to_be_bytes()[8 - len..]);
}
