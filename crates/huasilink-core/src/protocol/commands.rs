//! Protocol commands
//!
//! Defines the text commands understood by HUASI data collectors, the loose
//! option bag used by callers that drive the encoder from configuration, and
//! the typed command forms resolved from it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use super::ProtocolError;

/// Ordered list of (node name, twist angle in degrees) pairs.
///
/// Order is significant: it fixes node indexing on the collector and is
/// preserved verbatim in the encoded command.
pub type NodesTwist = Vec<(String, f64)>;

/// Command identifiers for collector communication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandId {
    /// Query calculation and layout mode
    GetMode,

    /// Read current measurement data
    GetData,

    /// Read current measurement data in packetized form
    GetMdata,

    /// Query which node numbers are attached
    GetNodes,

    /// Query per-node twist angles
    GetTwist,

    /// Query the collector clock
    GetTime,

    /// Query the sampling interval in seconds
    GetInterval,

    /// Query the firmware version
    GetVersion,

    /// Query the devices mounted on the collector
    GetDevices,

    /// Query the automatic upload channel
    GetUploadMode,

    /// Query the alarm threshold
    GetGlimit,

    /// Fetch history between two instants
    GetHistory,

    /// Reboot the collector
    Reset,

    /// Persist the current configuration
    Save,

    /// Synchronize the collector clock to local time
    UpdateTime,

    /// Set calculation and layout mode
    SetMode,

    /// Set the sampling interval
    SetInterval,

    /// Set per-node twist angles
    SetTwist,

    /// Select the automatic upload channel
    SetUploadMode,

    /// Turn automatic upload off
    InactiveUpload,

    /// Stream MDATA automatically
    ActiveMdataUpload,

    /// Stream TMDATA automatically
    ActiveTmdataUpload,

    /// Stream DATA automatically
    ActiveDataUpload,

    /// Set the alarm threshold
    SetGlimit,

    /// Acknowledge a received data frame ('OK' on the wire)
    #[serde(rename = "OK")]
    Ack,

    /// Re-scan and re-index attached nodes
    UpdateNodes,
}

impl CommandId {
    /// Wire-facing command name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandId::GetMode => "GET_MODE",
            CommandId::GetData => "GET_DATA",
            CommandId::GetMdata => "GET_MDATA",
            CommandId::GetNodes => "GET_NODES",
            CommandId::GetTwist => "GET_TWIST",
            CommandId::GetTime => "GET_TIME",
            CommandId::GetInterval => "GET_INTERVAL",
            CommandId::GetVersion => "GET_VERSION",
            CommandId::GetDevices => "GET_DEVICES",
            CommandId::GetUploadMode => "GET_UPLOAD_MODE",
            CommandId::GetGlimit => "GET_GLIMIT",
            CommandId::GetHistory => "GET_HISTORY",
            CommandId::Reset => "RESET",
            CommandId::Save => "SAVE",
            CommandId::UpdateTime => "UPDATE_TIME",
            CommandId::SetMode => "SET_MODE",
            CommandId::SetInterval => "SET_INTERVAL",
            CommandId::SetTwist => "SET_TWIST",
            CommandId::SetUploadMode => "SET_UPLOAD_MODE",
            CommandId::InactiveUpload => "INACTIVE_UPLOAD",
            CommandId::ActiveMdataUpload => "ACTIVE_MDATA_UPLOAD",
            CommandId::ActiveTmdataUpload => "ACTIVE_TMDATA_UPLOAD",
            CommandId::ActiveDataUpload => "ACTIVE_DATA_UPLOAD",
            CommandId::SetGlimit => "SET_GLIMIT",
            CommandId::Ack => "OK",
            CommandId::UpdateNodes => "UPDATE_NODES",
        }
    }

    /// Check if this command reads fields from the option bag
    pub fn requires_options(&self) -> bool {
        matches!(
            self,
            CommandId::SetMode
                | CommandId::SetInterval
                | CommandId::SetTwist
                | CommandId::SetUploadMode
                | CommandId::SetGlimit
                | CommandId::GetHistory
        )
    }

    /// Check if this command expects a response from the collector
    pub fn expects_response(&self) -> bool {
        !matches!(self, CommandId::Ack)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET_MODE" => Ok(CommandId::GetMode),
            "GET_DATA" => Ok(CommandId::GetData),
            "GET_MDATA" => Ok(CommandId::GetMdata),
            "GET_NODES" => Ok(CommandId::GetNodes),
            "GET_TWIST" => Ok(CommandId::GetTwist),
            "GET_TIME" => Ok(CommandId::GetTime),
            "GET_INTERVAL" => Ok(CommandId::GetInterval),
            "GET_VERSION" => Ok(CommandId::GetVersion),
            "GET_DEVICES" => Ok(CommandId::GetDevices),
            "GET_UPLOAD_MODE" => Ok(CommandId::GetUploadMode),
            "GET_GLIMIT" => Ok(CommandId::GetGlimit),
            "GET_HISTORY" => Ok(CommandId::GetHistory),
            "RESET" => Ok(CommandId::Reset),
            "SAVE" => Ok(CommandId::Save),
            "UPDATE_TIME" => Ok(CommandId::UpdateTime),
            "SET_MODE" => Ok(CommandId::SetMode),
            "SET_INTERVAL" => Ok(CommandId::SetInterval),
            "SET_TWIST" => Ok(CommandId::SetTwist),
            "SET_UPLOAD_MODE" => Ok(CommandId::SetUploadMode),
            "INACTIVE_UPLOAD" => Ok(CommandId::InactiveUpload),
            "ACTIVE_MDATA_UPLOAD" => Ok(CommandId::ActiveMdataUpload),
            "ACTIVE_TMDATA_UPLOAD" => Ok(CommandId::ActiveTmdataUpload),
            "ACTIVE_DATA_UPLOAD" => Ok(CommandId::ActiveDataUpload),
            "SET_GLIMIT" => Ok(CommandId::SetGlimit),
            "OK" => Ok(CommandId::Ack),
            "UPDATE_NODES" => Ok(CommandId::UpdateNodes),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

/// Twist calculation reference end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalType {
    /// Calculate from the near cable end
    NearEnd = 0,
    /// Calculate from the far cable end
    FarEnd = 1,
}

impl CalType {
    /// Wire value of this mode.
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for CalType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CalType::NearEnd),
            1 => Ok(CalType::FarEnd),
            other => Err(ProtocolError::InvalidParameter {
                name: "calType",
                value: other.to_string(),
            }),
        }
    }
}

/// Array layout on site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayType {
    /// Horizontal installation
    Horizontal = 0,
    /// Vertical installation
    Vertical = 1,
    /// Ring installation
    Ring = 2,
}

impl LayType {
    /// Wire value of this layout.
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for LayType {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(LayType::Horizontal),
            1 => Ok(LayType::Vertical),
            2 => Ok(LayType::Ring),
            other => Err(ProtocolError::InvalidParameter {
                name: "layType",
                value: other.to_string(),
            }),
        }
    }
}

/// Loose option bag for driving the encoder from configuration or IPC.
///
/// Field names match the camelCase keys accepted over JSON. Every field is
/// optional; each command reads only the subset it needs (see
/// [`TxtCommand::resolve`]).
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CmdOptions {
    /// Twist calculation mode: 0 near end, 1 far end
    pub cal_type: Option<u8>,

    /// Array layout: 0 horizontal, 1 vertical, 2 ring
    pub lay_type: Option<u8>,

    /// Sampling interval in seconds
    pub interval: Option<u32>,

    /// Initial twist of the whole array in degrees
    pub init_twist: Option<f64>,

    /// Per-node twist angles, in node order
    pub nodes_twist: Option<NodesTwist>,

    /// Automatic upload channel selector
    pub upload_mode: Option<u8>,

    /// Alarm threshold
    pub glimit: Option<f64>,

    /// History range start, Unix milliseconds, interpreted in local time
    pub history_from: Option<i64>,

    /// History range end, Unix milliseconds, interpreted in local time
    pub history_to: Option<i64>,
}

/// A fully-resolved collector command, parameters included.
///
/// Parameterized variants carry their required fields as domain types, so a
/// value of this enum is always encodable. Use [`TxtCommand::resolve`] to
/// build one from a [`CommandId`] plus a [`CmdOptions`] bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TxtCommand {
    /// Query calculation and layout mode
    GetMode,
    /// Read current measurement data
    GetData,
    /// Read current measurement data in packetized form
    GetMdata,
    /// Query which node numbers are attached
    GetNodes,
    /// Query per-node twist angles
    GetTwist,
    /// Query the collector clock
    GetTime,
    /// Query the sampling interval in seconds
    GetInterval,
    /// Query the firmware version
    GetVersion,
    /// Query the devices mounted on the collector
    GetDevices,
    /// Query the automatic upload channel
    GetUploadMode,
    /// Query the alarm threshold
    GetGlimit,
    /// Fetch history between two local-time instants
    GetHistory {
        /// Range start
        from: DateTime<Local>,
        /// Range end
        to: DateTime<Local>,
    },
    /// Reboot the collector
    Reset,
    /// Persist the current configuration
    Save,
    /// Synchronize the collector clock to local time, read at encode time
    UpdateTime,
    /// Set calculation and layout mode
    SetMode {
        /// Twist calculation reference end
        cal_type: CalType,
        /// Array layout on site
        lay_type: LayType,
    },
    /// Set the sampling interval (applies to all nodes)
    SetInterval {
        /// Interval in seconds; the protocol defines no upper bound
        seconds: u32,
    },
    /// Set per-node twist angles
    SetTwist {
        /// Angles per node, in node order
        nodes_twist: NodesTwist,
        /// Initial twist of the whole array, added to every node angle
        init_twist: f64,
    },
    /// Select the automatic upload channel
    SetUploadMode {
        /// Channel selector; the protocol defines no upper bound
        mode: u8,
    },
    /// Turn automatic upload off
    InactiveUpload,
    /// Stream MDATA automatically
    ActiveMdataUpload,
    /// Stream TMDATA automatically
    ActiveTmdataUpload,
    /// Stream DATA automatically
    ActiveDataUpload,
    /// Set the alarm threshold, clamped to [0.0001, 1] at encode time
    SetGlimit {
        /// Threshold value before clamping; must be finite
        glimit: f64,
    },
    /// Acknowledge a received data frame
    Ack,
    /// Re-scan and re-index attached nodes
    UpdateNodes,
}

impl TxtCommand {
    /// SET_TWIST with the array's initial twist left at 0 degrees.
    pub fn set_twist(nodes_twist: NodesTwist) -> Self {
        TxtCommand::SetTwist {
            nodes_twist,
            init_twist: 0.0,
        }
    }

    /// The identifier of this command.
    pub fn id(&self) -> CommandId {
        match self {
            TxtCommand::GetMode => CommandId::GetMode,
            TxtCommand::GetData => CommandId::GetData,
            TxtCommand::GetMdata => CommandId::GetMdata,
            TxtCommand::GetNodes => CommandId::GetNodes,
            TxtCommand::GetTwist => CommandId::GetTwist,
            TxtCommand::GetTime => CommandId::GetTime,
            TxtCommand::GetInterval => CommandId::GetInterval,
            TxtCommand::GetVersion => CommandId::GetVersion,
            TxtCommand::GetDevices => CommandId::GetDevices,
            TxtCommand::GetUploadMode => CommandId::GetUploadMode,
            TxtCommand::GetGlimit => CommandId::GetGlimit,
            TxtCommand::GetHistory { .. } => CommandId::GetHistory,
            TxtCommand::Reset => CommandId::Reset,
            TxtCommand::Save => CommandId::Save,
            TxtCommand::UpdateTime => CommandId::UpdateTime,
            TxtCommand::SetMode { .. } => CommandId::SetMode,
            TxtCommand::SetInterval { .. } => CommandId::SetInterval,
            TxtCommand::SetTwist { .. } => CommandId::SetTwist,
            TxtCommand::SetUploadMode { .. } => CommandId::SetUploadMode,
            TxtCommand::InactiveUpload => CommandId::InactiveUpload,
            TxtCommand::ActiveMdataUpload => CommandId::ActiveMdataUpload,
            TxtCommand::ActiveTmdataUpload => CommandId::ActiveTmdataUpload,
            TxtCommand::ActiveDataUpload => CommandId::ActiveDataUpload,
            TxtCommand::SetGlimit { .. } => CommandId::SetGlimit,
            TxtCommand::Ack => CommandId::Ack,
            TxtCommand::UpdateNodes => CommandId::UpdateNodes,
        }
    }

    /// Resolve a command identifier against an option bag.
    ///
    /// Validates presence and domain of every field the command requires;
    /// fields the command does not read are ignored.
    pub fn resolve(id: CommandId, options: &CmdOptions) -> Result<Self, ProtocolError> {
        let command = match id {
            CommandId::GetMode => TxtCommand::GetMode,
            CommandId::GetData => TxtCommand::GetData,
            CommandId::GetMdata => TxtCommand::GetMdata,
            CommandId::GetNodes => TxtCommand::GetNodes,
            CommandId::GetTwist => TxtCommand::GetTwist,
            CommandId::GetTime => TxtCommand::GetTime,
            CommandId::GetInterval => TxtCommand::GetInterval,
            CommandId::GetVersion => TxtCommand::GetVersion,
            CommandId::GetDevices => TxtCommand::GetDevices,
            CommandId::GetUploadMode => TxtCommand::GetUploadMode,
            CommandId::GetGlimit => TxtCommand::GetGlimit,
            CommandId::Reset => TxtCommand::Reset,
            CommandId::Save => TxtCommand::Save,
            CommandId::UpdateTime => TxtCommand::UpdateTime,
            CommandId::InactiveUpload => TxtCommand::InactiveUpload,
            CommandId::ActiveMdataUpload => TxtCommand::ActiveMdataUpload,
            CommandId::ActiveTmdataUpload => TxtCommand::ActiveTmdataUpload,
            CommandId::ActiveDataUpload => TxtCommand::ActiveDataUpload,
            CommandId::Ack => TxtCommand::Ack,
            CommandId::UpdateNodes => TxtCommand::UpdateNodes,
            CommandId::SetMode => {
                let cal_type = options
                    .cal_type
                    .ok_or(ProtocolError::MissingParameter("calType"))?;
                let lay_type = options
                    .lay_type
                    .ok_or(ProtocolError::MissingParameter("layType"))?;
                TxtCommand::SetMode {
                    cal_type: CalType::try_from(cal_type)?,
                    lay_type: LayType::try_from(lay_type)?,
                }
            }
            CommandId::SetInterval => {
                let seconds = options
                    .interval
                    .ok_or(ProtocolError::MissingParameter("interval"))?;
                TxtCommand::SetInterval { seconds }
            }
            CommandId::SetTwist => {
                let nodes_twist = options
                    .nodes_twist
                    .clone()
                    .ok_or(ProtocolError::MissingParameter("nodesTwist"))?;
                TxtCommand::SetTwist {
                    nodes_twist,
                    init_twist: options.init_twist.unwrap_or(0.0),
                }
            }
            CommandId::SetUploadMode => {
                let mode = options
                    .upload_mode
                    .ok_or(ProtocolError::MissingParameter("uploadMode"))?;
                TxtCommand::SetUploadMode { mode }
            }
            CommandId::SetGlimit => {
                let glimit = options
                    .glimit
                    .ok_or(ProtocolError::MissingParameter("glimit"))?;
                if !glimit.is_finite() {
                    return Err(ProtocolError::InvalidParameter {
                        name: "glimit",
                        value: glimit.to_string(),
                    });
                }
                TxtCommand::SetGlimit { glimit }
            }
            CommandId::GetHistory => {
                let from = options
                    .history_from
                    .ok_or(ProtocolError::MissingParameter("historyFrom"))?;
                let to = options
                    .history_to
                    .ok_or(ProtocolError::MissingParameter("historyTo"))?;
                TxtCommand::GetHistory {
                    from: local_from_millis(from, "historyFrom")?,
                    to: local_from_millis(to, "historyTo")?,
                }
            }
        };
        Ok(command)
    }
}

/// Interpret a millisecond Unix timestamp in the local timezone.
fn local_from_millis(millis: i64, name: &'static str) -> Result<DateTime<Local>, ProtocolError> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ProtocolError::InvalidParameter {
            name,
            value: millis.to_string(),
        })
}
