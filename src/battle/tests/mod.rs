pub mod common;


#[cfg(test)]
mod test_fainting;



#[cfg(test)]
mod test_damage_effects;



#[cfg(test)]
mod test_mist;

#[cfg(test)]
mod test_pp_use;


#[cfg(test)]
mod test_move_restrictions;
