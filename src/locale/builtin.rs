use super::PhraseBundle;

pub(super) fn bundles() -> Vec<PhraseBundle> {
    vec![english(), russian()]
}

pub(super) fn english() -> PhraseBundle {
    PhraseBundle {
        language_code: "en".into(),

        registrate_btn: "Register".into(),
        generate_teams_btn: "Generate teams".into(),
        registration_command: "/start-registration".into(),
        team_choosing_command: "/generate-teams".into(),

        yes_btn: "Yes".into(),
        no_btn: "No".into(),
        answer: "Answer".into(),
        wrong_btn_pressing: "This button is no longer active. Please use the latest message."
            .into(),
        unexpected_text: "Please answer by pressing one of the buttons above.".into(),
        fallback: vec![
            "I did not get that. Pick something from the menu below.".into(),
            "Hmm, no idea what that means. Try the menu.".into(),
            "That is not a command I know.".into(),
        ],
        input_field_placeholder: "Choose an action".into(),

        reg_nickname_request: "Send me the nickname you want to play under.".into(),
        reg_nickname_in_use: "The nickname {nickname} is already taken. Try another one.".into(),
        reg_nickname_invalid: "A nickname must be between 1 and 64 characters long.".into(),
        reg_nickname_confirm: "Register as {nickname}?".into(),
        reg_nickname_request_again: "Alright, send me another nickname.".into(),
        reg_done: "Done! You are registered as {nickname}.".into(),
        reg_after: "You can now generate teams from the menu.".into(),
        reg_already_registered: "You are already registered as {nickname}.".into(),

        tc_players_count_request: "How many players?".into(),
        tc_rating_request: "Which team rating?".into(),
        tc_teams_country_request: "Teams from which country?".into(),
        tc_teams_country_never_mind_btn: "Never mind".into(),
        team_description: "Player {player_number}: {team_name} ({league})\n\
            General: {general} | Attack: {attack} | Midfield: {midfield} | Defense: {defense}"
            .into(),
        tc_change_team_btn: "Change team for player {player_number}".into(),
        tc_confirm_teams_btn: "Confirm teams".into(),
        tc_no_more_teams: "There are no more teams left to swap in.".into(),
        tc_not_enough_teams: "Only {available} team(s) match, {players} are needed. \
            Try another rating."
            .into(),
        tc_first_round_pairs: "First round:".into(),
        tc_pair: "Player {first} vs Player {second}".into(),
        tc_done: "Teams are set. Have a good game!".into(),
    }
}

pub(super) fn russian() -> PhraseBundle {
    PhraseBundle {
        language_code: "ru".into(),

        registrate_btn: "Регистрация".into(),
        generate_teams_btn: "Сгенерировать команды".into(),
        registration_command: "/start-registration".into(),
        team_choosing_command: "/generate-teams".into(),

        yes_btn: "Да".into(),
        no_btn: "Нет".into(),
        answer: "Ответ".into(),
        wrong_btn_pressing: "Эта кнопка больше не активна. Используйте последнее сообщение."
            .into(),
        unexpected_text: "Пожалуйста, ответьте нажатием одной из кнопок выше.".into(),
        fallback: vec![
            "Не понял. Выберите действие в меню ниже.".into(),
            "Хм, не знаю, что это значит. Попробуйте меню.".into(),
            "Такой команды я не знаю.".into(),
        ],
        input_field_placeholder: "Выберите действие".into(),

        reg_nickname_request: "Пришлите никнейм, под которым будете играть.".into(),
        reg_nickname_in_use: "Никнейм {nickname} уже занят. Попробуйте другой.".into(),
        reg_nickname_invalid: "Никнейм должен содержать от 1 до 64 символов.".into(),
        reg_nickname_confirm: "Зарегистрироваться как {nickname}?".into(),
        reg_nickname_request_again: "Хорошо, пришлите другой никнейм.".into(),
        reg_done: "Готово! Вы зарегистрированы как {nickname}.".into(),
        reg_after: "Теперь можно сгенерировать команды из меню.".into(),
        reg_already_registered: "Вы уже зарегистрированы как {nickname}.".into(),

        tc_players_count_request: "Сколько игроков?".into(),
        tc_rating_request: "Какой рейтинг команд?".into(),
        tc_teams_country_request: "Команды из какой страны?".into(),
        tc_teams_country_never_mind_btn: "Неважно".into(),
        team_description: "Игрок {player_number}: {team_name} ({league})\n\
            Общий: {general} | Атака: {attack} | Полузащита: {midfield} | Защита: {defense}"
            .into(),
        tc_change_team_btn: "Сменить команду игроку {player_number}".into(),
        tc_confirm_teams_btn: "Подтвердить команды".into(),
        tc_no_more_teams: "Больше нет команд для замены.".into(),
        tc_not_enough_teams: "Подходит только команд: {available}, а нужно {players}. \
            Попробуйте другой рейтинг."
            .into(),
        tc_first_round_pairs: "Первый круг:".into(),
        tc_pair: "Игрок {first} против игрока {second}".into(),
        tc_done: "Команды выбраны. Хорошей игры!".into(),
    }
}
