//! Build and open a `CliSession` for one inventory record.

use netcat_core::{CliSession, NetcatConfig, NetcatError};

use crate::inventory::DeviceRecord;

pub fn open_session(record: &DeviceRecord) -> Result<CliSession, NetcatError> {
    let mut builder = NetcatConfig::builder()
        .host(record.name.clone())
        .username(record.username.clone())
        .auth_mode(record.auth_mode);

    if let Some(password) = &record.password {
        builder = builder.password(password.clone());
    }

    let mut session = CliSession::new(builder.build());
    session.open()?;
    Ok(session)
}
