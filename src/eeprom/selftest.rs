use crate::clock::Clock;
use crate::i2c::I2cBus;

use super::Eeprom;

pub fn test_device<B: I2cBus, C: Clock>(eeprom: &mut Eeprom<B, C>) -> crate::AResult<()> {
	ensure!(eeprom.is_ready(), "No {} responding at 0x{:02x}", eeprom.variant(), eeprom.i2c_address());
	Ok(())
}

// writes `value` and reads it back; the original content is restored afterwards
pub fn test_read_write<B: I2cBus, C: Clock>(eeprom: &mut Eeprom<B, C>, address: u16, value: u8) -> crate::AResult<()> {
	let original = eeprom.read_byte(address)?;
	eeprom.write_byte(address, value)?;
	let found = eeprom.read_byte(address)?;
	if found != value {
		// best effort, report the verify failure anyway
		if let Err(e) = eeprom.write_byte(address, original) {
			warn!("Couldn't restore 0x{:02x} at 0x{:04x}: {}", original, address, e);
		}
		bail!("Verify failed at 0x{:04x}: wrote 0x{:02x}, read back 0x{:02x}", address, value, found);
	}
	if original != value {
		eeprom.write_byte(address, original)?;
	}
	Ok(())
}

pub fn read_image<B: I2cBus, C: Clock>(eeprom: &mut Eeprom<B, C>, address: u16, length: usize) -> crate::AResult<Vec<u8>> {
	let mut image = vec![0u8; length];
	with_context!(("couldn't read {} bytes at 0x{:04x}", length, address), {
		eeprom.read_bytes(address, &mut image)?;
		Ok(())
	})?;
	Ok(image)
}

pub fn write_image<B: I2cBus, C: Clock>(eeprom: &mut Eeprom<B, C>, address: u16, image: &[u8]) -> crate::AResult<()> {
	with_context!(("couldn't write {} bytes at 0x{:04x}", image.len(), address), {
		eeprom.write_bytes(address, image)?;
		Ok(())
	})?;

	// verify
	let flash = read_image(eeprom, address, image.len())?;
	for offset in 0..image.len() {
		ensure!(flash[offset] == image[offset],
			"Verify failed at {:04x}: expected {:02x}, flash is {:02x}", address as usize + offset, image[offset], flash[offset]
		);
	}

	info!("Wrote and verified {} bytes at 0x{:04x}", image.len(), address);
	Ok(())
}
