//! Daemon protocol messages (`mbtool.daemon.v2`).

use slate_common::result::Result;

use crate::{
    adapter::{FlatTable, ObjectWriter},
    builder::Builder,
    offset::Offset,
    table::{Table, root},
};

/// Reply to a file open request.
///
/// ```text
/// table OpenResponse {
///     success: ubyte;
///     error_msg: string;
/// }
/// ```
#[derive(Clone, Copy, Debug)]
pub struct OpenResponse<'a> {
    table: Table<'a>,
}

impl<'a> OpenResponse<'a> {
    pub const VT_SUCCESS: u16 = 0;
    pub const VT_ERROR_MSG: u16 = 1;

    pub fn root(buf: &'a [u8]) -> Result<OpenResponse<'a>> {
        root(buf)
    }

    pub fn success(&self) -> Result<u8> {
        self.read_field(Self::VT_SUCCESS, 0)
    }

    pub fn error_msg(&self) -> Result<Option<&'a str>> {
        self.read_string(Self::VT_ERROR_MSG)
    }

    /// The error message bytes, without UTF-8 validation.
    pub fn error_msg_bytes(&self) -> Result<Option<&'a [u8]>> {
        self.read_bytes(Self::VT_ERROR_MSG)
    }

    /// Reads every field once, so that later accessor calls cannot fail.
    pub fn verify(&self) -> Result<()> {
        self.success()?;
        self.error_msg()?;
        Ok(())
    }

    pub fn create(
        builder: &mut Builder,
        args: &OpenResponseArgs,
    ) -> Result<Offset<OpenResponse<'static>>> {
        let mut writer = OpenResponseBuilder::new(builder)?;
        if let Some(error_msg) = args.error_msg {
            writer.add_error_msg(error_msg)?;
        }
        writer.add_success(args.success)?;
        writer.finish()
    }
}

impl<'a> FlatTable<'a> for OpenResponse<'a> {
    const FIELD_COUNT: u16 = 2;

    fn from_table(table: Table<'a>) -> Self {
        OpenResponse { table }
    }

    fn as_table(&self) -> Table<'a> {
        self.table
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenResponseArgs {
    pub success: u8,
    pub error_msg: Option<Offset<str>>,
}

pub struct OpenResponseBuilder<'b> {
    writer: ObjectWriter<'b, OpenResponse<'static>>,
}

impl<'b> OpenResponseBuilder<'b> {
    pub fn new(builder: &'b mut Builder) -> Result<OpenResponseBuilder<'b>> {
        Ok(OpenResponseBuilder {
            writer: ObjectWriter::start(builder, OpenResponse::FIELD_COUNT)?,
        })
    }

    pub fn add_success(&mut self, success: u8) -> Result<()> {
        self.writer.write_field(OpenResponse::VT_SUCCESS, success, 0)
    }

    pub fn add_error_msg(&mut self, error_msg: Offset<str>) -> Result<()> {
        self.writer.write_offset(OpenResponse::VT_ERROR_MSG, error_msg)
    }

    pub fn finish(self) -> Result<Offset<OpenResponse<'static>>> {
        self.writer.finish()
    }
}

/// Asks the daemon for its version. Carries no fields.
#[derive(Clone, Copy, Debug)]
pub struct GetVersionRequest<'a> {
    table: Table<'a>,
}

impl<'a> GetVersionRequest<'a> {
    pub fn root(buf: &'a [u8]) -> Result<GetVersionRequest<'a>> {
        root(buf)
    }

    pub fn verify(&self) -> Result<()> {
        Ok(())
    }

    pub fn create(builder: &mut Builder) -> Result<Offset<GetVersionRequest<'static>>> {
        ObjectWriter::start(builder, GetVersionRequest::FIELD_COUNT)?.finish()
    }
}

impl<'a> FlatTable<'a> for GetVersionRequest<'a> {
    const FIELD_COUNT: u16 = 0;

    fn from_table(table: Table<'a>) -> Self {
        GetVersionRequest { table }
    }

    fn as_table(&self) -> Table<'a> {
        self.table
    }
}

/// ```text
/// table GetVersionResponse {
///     version: string;
/// }
/// ```
#[derive(Clone, Copy, Debug)]
pub struct GetVersionResponse<'a> {
    table: Table<'a>,
}

impl<'a> GetVersionResponse<'a> {
    pub const VT_VERSION: u16 = 0;

    pub fn root(buf: &'a [u8]) -> Result<GetVersionResponse<'a>> {
        root(buf)
    }

    pub fn version(&self) -> Result<Option<&'a str>> {
        self.read_string(Self::VT_VERSION)
    }

    pub fn verify(&self) -> Result<()> {
        self.version()?;
        Ok(())
    }

    pub fn create(
        builder: &mut Builder,
        version: Option<Offset<str>>,
    ) -> Result<Offset<GetVersionResponse<'static>>> {
        let mut writer = GetVersionResponseBuilder::new(builder)?;
        if let Some(version) = version {
            writer.add_version(version)?;
        }
        writer.finish()
    }
}

impl<'a> FlatTable<'a> for GetVersionResponse<'a> {
    const FIELD_COUNT: u16 = 1;

    fn from_table(table: Table<'a>) -> Self {
        GetVersionResponse { table }
    }

    fn as_table(&self) -> Table<'a> {
        self.table
    }
}

pub struct GetVersionResponseBuilder<'b> {
    writer: ObjectWriter<'b, GetVersionResponse<'static>>,
}

impl<'b> GetVersionResponseBuilder<'b> {
    pub fn new(builder: &'b mut Builder) -> Result<GetVersionResponseBuilder<'b>> {
        Ok(GetVersionResponseBuilder {
            writer: ObjectWriter::start(builder, GetVersionResponse::FIELD_COUNT)?,
        })
    }

    pub fn add_version(&mut self, version: Offset<str>) -> Result<()> {
        self.writer.write_offset(GetVersionResponse::VT_VERSION, version)
    }

    pub fn finish(self) -> Result<Offset<GetVersionResponse<'static>>> {
        self.writer.finish()
    }
}
