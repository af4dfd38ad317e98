//! Command Builder
//!
//! Renders collector commands into framed, checksummed byte buffers. A
//! builder is bound to one device serial number for its lifetime; every
//! encode call is independent and has no side effects beyond its return
//! value.

use chrono::{DateTime, Local};
use tracing::debug;

use super::{
    commands::{CmdOptions, CommandId, TxtCommand},
    Frame, ProtocolError, VENDOR_TOKEN,
};

/// Timestamp layout inside GET_HISTORY bodies (two-digit year)
const HISTORY_TIME_FORMAT: &str = "%y,%m,%d,%H,%M,%S";

/// Timestamp layout inside SET_DATE bodies (four-digit year)
const DATE_SYNC_FORMAT: &str = "%Y,%m,%d,%H,%M,%S";

/// Lower clamp bound for the alarm threshold
const GLIMIT_MIN: f64 = 0.0001;

/// Upper clamp bound for the alarm threshold
const GLIMIT_MAX: f64 = 1.0;

/// Builds framed text commands for one collector
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    /// Device serial number, interpolated verbatim into command bodies
    sncode: String,
}

impl CommandBuilder {
    /// Create a builder bound to the given device serial number.
    pub fn new(sncode: impl Into<String>) -> Self {
        Self {
            sncode: sncode.into(),
        }
    }

    /// The serial number this builder encodes for.
    pub fn sncode(&self) -> &str {
        &self.sncode
    }

    /// Resolve a command identifier against an option bag and encode it.
    ///
    /// This is the loose entry point for callers driving the encoder from
    /// configuration. Validation happens before any bytes are produced: a
    /// missing or out-of-domain option fails the call and nothing is
    /// returned.
    pub fn create(&self, id: CommandId, options: &CmdOptions) -> Result<Vec<u8>, ProtocolError> {
        let command = TxtCommand::resolve(id, options)?;
        self.encode(&command)
    }

    /// Encode a typed command into a transmit-ready frame.
    pub fn encode(&self, command: &TxtCommand) -> Result<Vec<u8>, ProtocolError> {
        let body = self.render_body(command);
        debug!(command = %command.id(), body = %body, "encoded collector command");
        Ok(Frame::new(body)?.to_bytes())
    }

    /// Render the unframed ASCII body for a command.
    fn render_body(&self, command: &TxtCommand) -> String {
        let sn = &self.sncode;
        match command {
            TxtCommand::GetMode => format!("{},GET,MODEL,{}", VENDOR_TOKEN, sn),
            TxtCommand::GetData => format!("{},GET,DATA,{}", VENDOR_TOKEN, sn),
            TxtCommand::GetMdata => format!("{},GET,MDATA,{}", VENDOR_TOKEN, sn),
            TxtCommand::GetNodes => format!("{},GET,DEVICE,{}", VENDOR_TOKEN, sn),
            TxtCommand::GetTwist => format!("{},GET,AZIMUTH,{}", VENDOR_TOKEN, sn),
            TxtCommand::GetTime => format!("{},GET,DATE", VENDOR_TOKEN),
            TxtCommand::GetInterval => format!("{},GET,NODE,TIMER", VENDOR_TOKEN),
            TxtCommand::GetVersion => format!("{},GET,VERSION", VENDOR_TOKEN),
            TxtCommand::GetDevices => format!("{},GET,DEVICES", VENDOR_TOKEN),
            TxtCommand::GetUploadMode => format!("{},GET,UPLOADMODEL,{}", VENDOR_TOKEN, sn),
            // The device firmware really does spell the threshold command GLIMINT
            TxtCommand::GetGlimit => format!("{},GET,GLIMINT,{}", VENDOR_TOKEN, sn),
            TxtCommand::GetHistory { from, to } => format!(
                "{},GET,HISTORY,{},{},{}",
                VENDOR_TOKEN,
                sn,
                from.format(HISTORY_TIME_FORMAT),
                to.format(HISTORY_TIME_FORMAT)
            ),
            TxtCommand::Reset => format!("{},SET,RESET", VENDOR_TOKEN),
            TxtCommand::Save => format!("{},SET,SAVE", VENDOR_TOKEN),
            TxtCommand::UpdateTime => Self::date_sync_body(&Local::now()),
            TxtCommand::SetMode { cal_type, lay_type } => format!(
                "{},SET,MODEL,{},{},{}",
                VENDOR_TOKEN,
                sn,
                cal_type.as_u8(),
                lay_type.as_u8()
            ),
            TxtCommand::SetInterval { seconds } => {
                format!("{},SET,NODE,TIMER,{}", VENDOR_TOKEN, seconds)
            }
            TxtCommand::SetTwist {
                nodes_twist,
                init_twist,
            } => {
                let mut tokens = Vec::with_capacity(nodes_twist.len() * 2);
                for (node, twist) in nodes_twist {
                    // Each node angle is offset by the initial twist of the
                    // whole array
                    let angle = twist + init_twist;
                    tokens.push(node.clone());
                    tokens.push(angle.to_string());
                }
                format!(
                    "{},SET,AZIMUTH,{},{},{}",
                    VENDOR_TOKEN,
                    sn,
                    nodes_twist.len(),
                    tokens.join(",")
                )
            }
            TxtCommand::SetUploadMode { mode } => {
                format!("{},SET,UPLOADMODEL,{},{}", VENDOR_TOKEN, sn, mode)
            }
            TxtCommand::InactiveUpload => format!("{},SET,UPLOADMODEL,{},0", VENDOR_TOKEN, sn),
            TxtCommand::ActiveMdataUpload => format!("{},SET,UPLOADMODEL,{},1", VENDOR_TOKEN, sn),
            TxtCommand::ActiveTmdataUpload => format!("{},SET,UPLOADMODEL,{},2", VENDOR_TOKEN, sn),
            TxtCommand::ActiveDataUpload => format!("{},SET,UPLOADMODEL,{},3", VENDOR_TOKEN, sn),
            TxtCommand::SetGlimit { glimit } => {
                let mut limit = if *glimit > GLIMIT_MAX { GLIMIT_MAX } else { *glimit };
                if limit < GLIMIT_MIN {
                    limit = GLIMIT_MIN;
                }
                format!("{},SET,GLIMINT,{},{}", VENDOR_TOKEN, sn, limit)
            }
            TxtCommand::Ack => format!("{},OK", VENDOR_TOKEN),
            TxtCommand::UpdateNodes => format!("{},SET,GETCAL", VENDOR_TOKEN),
        }
    }

    /// Body of the clock-sync command for a given instant.
    fn date_sync_body(now: &DateTime<Local>) -> String {
        format!("{},SET,DATE,{}", VENDOR_TOKEN, now.format(DATE_SYNC_FORMAT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{checksum, CalType, LayType};
    use chrono::TimeZone;

    fn builder() -> CommandBuilder {
        CommandBuilder::new("280537")
    }

    /// Extract the body between `$` and `*` of an encoded frame.
    fn body_of(frame: &[u8]) -> String {
        let text = std::str::from_utf8(frame).unwrap();
        let start = text.find('$').unwrap() + 1;
        let end = text.rfind('*').unwrap();
        text[start..end].to_string()
    }

    #[test]
    fn test_get_data_exact_frame() {
        let frame = builder().encode(&TxtCommand::GetData).unwrap();
        assert_eq!(frame, b"$HUASI,GET,DATA,280537*27\r\n");
    }

    #[test]
    fn test_query_bodies_interpolate_serial() {
        let builder = builder();
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::GetMode).unwrap()),
            "HUASI,GET,MODEL,280537"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::GetNodes).unwrap()),
            "HUASI,GET,DEVICE,280537"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::GetTwist).unwrap()),
            "HUASI,GET,AZIMUTH,280537"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::GetGlimit).unwrap()),
            "HUASI,GET,GLIMINT,280537"
        );
    }

    #[test]
    fn test_fixed_literal_bodies() {
        let builder = builder();
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::GetTime).unwrap()),
            "HUASI,GET,DATE"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::GetInterval).unwrap()),
            "HUASI,GET,NODE,TIMER"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::Reset).unwrap()),
            "HUASI,SET,RESET"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::Save).unwrap()),
            "HUASI,SET,SAVE"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::Ack).unwrap()),
            "HUASI,OK"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::UpdateNodes).unwrap()),
            "HUASI,SET,GETCAL"
        );
    }

    #[test]
    fn test_set_mode_body() {
        let frame = builder()
            .encode(&TxtCommand::SetMode {
                cal_type: CalType::NearEnd,
                lay_type: LayType::Vertical,
            })
            .unwrap();
        assert_eq!(body_of(&frame), "HUASI,SET,MODEL,280537,0,1");
    }

    #[test]
    fn test_set_interval_body() {
        let frame = builder()
            .encode(&TxtCommand::SetInterval { seconds: 600 })
            .unwrap();
        assert_eq!(body_of(&frame), "HUASI,SET,NODE,TIMER,600");
    }

    #[test]
    fn test_set_twist_adds_init_and_preserves_order() {
        let frame = builder()
            .encode(&TxtCommand::SetTwist {
                nodes_twist: vec![("N1".to_string(), 10.0), ("N2".to_string(), 20.0)],
                init_twist: 5.0,
            })
            .unwrap();
        assert_eq!(body_of(&frame), "HUASI,SET,AZIMUTH,280537,2,N1,15,N2,25");
    }

    #[test]
    fn test_set_twist_fractional_angles() {
        let frame = builder()
            .encode(&TxtCommand::SetTwist {
                nodes_twist: vec![("0001".to_string(), 1.25)],
                init_twist: 0.5,
            })
            .unwrap();
        assert_eq!(body_of(&frame), "HUASI,SET,AZIMUTH,280537,1,0001,1.75");
    }

    #[test]
    fn test_upload_mode_bodies() {
        let builder = builder();
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::SetUploadMode { mode: 7 }).unwrap()),
            "HUASI,SET,UPLOADMODEL,280537,7"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::InactiveUpload).unwrap()),
            "HUASI,SET,UPLOADMODEL,280537,0"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::ActiveMdataUpload).unwrap()),
            "HUASI,SET,UPLOADMODEL,280537,1"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::ActiveTmdataUpload).unwrap()),
            "HUASI,SET,UPLOADMODEL,280537,2"
        );
        assert_eq!(
            body_of(&builder.encode(&TxtCommand::ActiveDataUpload).unwrap()),
            "HUASI,SET,UPLOADMODEL,280537,3"
        );
    }

    #[test]
    fn test_glimit_clamped_high() {
        let frame = builder()
            .encode(&TxtCommand::SetGlimit { glimit: 5.0 })
            .unwrap();
        assert_eq!(body_of(&frame), "HUASI,SET,GLIMINT,280537,1");
    }

    #[test]
    fn test_glimit_clamped_low() {
        let frame = builder()
            .encode(&TxtCommand::SetGlimit { glimit: 0.00001 })
            .unwrap();
        assert_eq!(body_of(&frame), "HUASI,SET,GLIMINT,280537,0.0001");
    }

    #[test]
    fn test_glimit_in_range_passes_through() {
        let frame = builder()
            .encode(&TxtCommand::SetGlimit { glimit: 0.5 })
            .unwrap();
        assert_eq!(body_of(&frame), "HUASI,SET,GLIMINT,280537,0.5");
    }

    #[test]
    fn test_history_body_format() {
        let from = Local.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
        let to = Local.with_ymd_and_hms(2023, 11, 22, 13, 44, 55).unwrap();
        let frame = builder()
            .encode(&TxtCommand::GetHistory { from, to })
            .unwrap();
        assert_eq!(
            body_of(&frame),
            "HUASI,GET,HISTORY,280537,23,01,02,03,04,05,23,11,22,13,44,55"
        );
    }

    #[test]
    fn test_date_sync_body_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 8, 9, 7).unwrap();
        assert_eq!(
            CommandBuilder::date_sync_body(&now),
            "HUASI,SET,DATE,2024,03,05,08,09,07"
        );
    }

    #[test]
    fn test_update_time_reads_clock() {
        let frame = builder().encode(&TxtCommand::UpdateTime).unwrap();
        let body = body_of(&frame);
        assert!(body.starts_with("HUASI,SET,DATE,"));
        // HUASI,SET,DATE plus six time fields
        assert_eq!(body.split(',').count(), 9);
    }

    #[test]
    fn test_create_resolves_and_encodes() {
        let options = CmdOptions {
            cal_type: Some(1),
            lay_type: Some(2),
            ..Default::default()
        };
        let frame = builder().create(CommandId::SetMode, &options).unwrap();
        assert_eq!(body_of(&frame), "HUASI,SET,MODEL,280537,1,2");
    }

    #[test]
    fn test_create_fails_before_producing_bytes() {
        let err = builder()
            .create(CommandId::SetInterval, &CmdOptions::default())
            .unwrap_err();
        assert!(matches!(err, ProtocolError::MissingParameter("interval")));
    }

    #[test]
    fn test_frame_checksum_matches_body() {
        let frame = builder().encode(&TxtCommand::GetVersion).unwrap();
        let body = body_of(&frame);
        let text = std::str::from_utf8(&frame).unwrap();
        let hex = &text[text.rfind('*').unwrap() + 1..text.len() - 2];
        assert_eq!(hex, format!("{:02X}", checksum(body.as_bytes())));
    }

    #[test]
    fn test_serial_number_verbatim() {
        let builder = CommandBuilder::new("SN-00:7");
        let frame = builder.encode(&TxtCommand::GetData).unwrap();
        assert_eq!(body_of(&frame), "HUASI,GET,DATA,SN-00:7");
        assert_eq!(builder.sncode(), "SN-00:7");
    }
}
